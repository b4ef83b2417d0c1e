use sea_orm_migration::prelude::*;

/// Version 1 to 2: adds the `meta` table and the `url`/`updated` show columns.
///
/// Version 1 stores carry no source url, so there is nothing worth keeping: both data
/// tables are dropped and recreated.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Episodes::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Shows::Table).if_exists().to_owned())
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Meta::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Meta::Key).text().not_null().primary_key())
                    .col(ColumnDef::new(Meta::Value).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Shows::Table)
                    .col(
                        ColumnDef::new(Shows::ShowId)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Shows::ShowName).text().not_null())
                    .col(ColumnDef::new(Shows::Url).text().not_null().unique_key())
                    .col(ColumnDef::new(Shows::Updated).date_time())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Episodes::Table)
                    .col(ColumnDef::new(Episodes::ShowId).integer().not_null())
                    .col(ColumnDef::new(Episodes::Num).integer().not_null())
                    .col(ColumnDef::new(Episodes::Airdate).date().not_null())
                    .col(ColumnDef::new(Episodes::Season).integer().not_null())
                    .col(ColumnDef::new(Episodes::Title).text().not_null())
                    .col(ColumnDef::new(Episodes::Totalnum).integer().not_null())
                    .col(ColumnDef::new(Episodes::Prodnum).text().not_null())
                    .primary_key(
                        Index::create()
                            .col(Episodes::ShowId)
                            .col(Episodes::Season)
                            .col(Episodes::Num),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, _manager: &SchemaManager) -> Result<(), DbErr> {
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Meta {
    Table,
    Key,
    Value,
}

#[derive(DeriveIden)]
enum Shows {
    Table,
    ShowId,
    ShowName,
    Url,
    Updated,
}

#[derive(DeriveIden)]
enum Episodes {
    Table,
    ShowId,
    Num,
    Airdate,
    Season,
    Title,
    Totalnum,
    Prodnum,
}
