use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "shows")]
pub struct Model {
    #[sea_orm(primary_key, column_name = "show_id")]
    pub id: i32,
    #[sea_orm(column_name = "show_name")]
    pub name: String,
    #[sea_orm(unique)]
    pub url: String,
    /// Rows carried over from older schemas may have no timestamp.
    pub updated: Option<DateTime>,
    pub enabled: bool,
    /// 1 = running, 2 = suspended, 3 = ended
    pub status: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::episodes::Entity")]
    Episodes,
}

impl Related<super::episodes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Episodes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
