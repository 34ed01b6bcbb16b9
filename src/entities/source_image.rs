use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "source_images")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub file_path: String,
    pub file_size: Option<i64>,
    pub file_extension: Option<String>,
    pub uploaded_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::analysis_request::Entity")]
    AnalysisRequest,
}

impl Related<super::analysis_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AnalysisRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
