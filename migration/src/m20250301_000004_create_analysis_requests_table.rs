use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AnalysisRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AnalysisRequests::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AnalysisRequests::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(AnalysisRequests::RegionId).uuid())
                    .col(
                        ColumnDef::new(AnalysisRequests::SourceImageId)
                            .uuid()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(AnalysisRequests::AlgorithmName)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AnalysisRequests::Status)
                            .string()
                            .not_null()
                            .default("PENDING")
                            .check(Expr::col(AnalysisRequests::Status).is_in([
                                "PENDING",
                                "PROCESSING",
                                "COMPLETED",
                                "ERROR",
                            ])),
                    )
                    .col(
                        ColumnDef::new(AnalysisRequests::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_analysis_requests_user_id")
                            .from(AnalysisRequests::Table, AnalysisRequests::UserId)
                            .to(Users::Table, Users::TelegramId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_analysis_requests_region_id")
                            .from(AnalysisRequests::Table, AnalysisRequests::RegionId)
                            .to(Regions::Table, Regions::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_analysis_requests_source_image_id")
                            .from(AnalysisRequests::Table, AnalysisRequests::SourceImageId)
                            .to(SourceImages::Table, SourceImages::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_analysis_requests_user_id")
                    .table(AnalysisRequests::Table)
                    .col(AnalysisRequests::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_analysis_requests_status")
                    .table(AnalysisRequests::Table)
                    .col(AnalysisRequests::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AnalysisRequests::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AnalysisRequests {
    Table,
    Id,
    UserId,
    RegionId,
    SourceImageId,
    AlgorithmName,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    TelegramId,
}

#[derive(DeriveIden)]
enum Regions {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum SourceImages {
    Table,
    Id,
}
