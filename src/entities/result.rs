use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "results")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub analysis_request_id: Uuid,
    pub metadata: Json,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::analysis_request::Entity",
        from = "Column::AnalysisRequestId",
        to = "super::analysis_request::Column::Id",
        on_delete = "Cascade"
    )]
    AnalysisRequest,
}

impl Related<super::analysis_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AnalysisRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
