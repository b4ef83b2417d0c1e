use crate::entities::{meta, prelude::*};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter, Set};

pub struct MetaRepository<'a> {
    conn: &'a DatabaseTransaction,
}

impl<'a> MetaRepository<'a> {
    #[must_use]
    pub const fn new(conn: &'a DatabaseTransaction) -> Self {
        Self { conn }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, DbErr> {
        let row = Meta::find()
            .filter(meta::Column::Key.eq(key))
            .one(self.conn)
            .await?;
        Ok(row.map(|m| m.value))
    }

    // Older `meta` tables have no primary key, so ON CONFLICT cannot be relied on.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), DbErr> {
        let result = Meta::update_many()
            .col_expr(meta::Column::Value, Expr::value(value))
            .filter(meta::Column::Key.eq(key))
            .exec(self.conn)
            .await?;

        if result.rows_affected == 0 {
            Meta::insert(meta::ActiveModel {
                key: Set(key.to_string()),
                value: Set(value.to_string()),
            })
            .exec_without_returning(self.conn)
            .await?;
        }

        Ok(())
    }
}
