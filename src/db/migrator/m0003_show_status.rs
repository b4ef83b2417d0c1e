use super::ignore_duplicate_column;
use sea_orm_migration::prelude::*;

/// Version 2 to 3: per-show `enabled` flag and `status` code.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // SQLite takes one ADD COLUMN per statement.
        ignore_duplicate_column(
            manager
                .alter_table(
                    Table::alter()
                        .table(Shows::Table)
                        .add_column(
                            ColumnDef::new(Shows::Enabled)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await,
        )?;

        ignore_duplicate_column(
            manager
                .alter_table(
                    Table::alter()
                        .table(Shows::Table)
                        .add_column(
                            ColumnDef::new(Shows::Status)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .to_owned(),
                )
                .await,
        )
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Shows::Table)
                    .drop_column(Shows::Status)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Shows::Table)
                    .drop_column(Shows::Enabled)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Shows {
    Table,
    Enabled,
    Status,
}
