use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SourceImages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SourceImages::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SourceImages::FilePath).text().not_null())
                    .col(ColumnDef::new(SourceImages::FileSize).big_integer())
                    .col(ColumnDef::new(SourceImages::FileExtension).string())
                    .col(
                        ColumnDef::new(SourceImages::UploadedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SourceImages::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SourceImages {
    Table,
    Id,
    FilePath,
    FileSize,
    FileExtension,
    UploadedAt,
}
