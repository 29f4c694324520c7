use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "certificate_generators")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub response_set_id: Option<i32>,
    pub certification_campaign_id: Option<i32>,
    pub request: String, // raw JSON payload
    pub completed: bool,
    pub status: String, // CREATED/QUEUED/CLAIMED/DONE/FAILED
    pub jurisdiction: Option<String>,
    pub create_user: bool,
    pub existing_dataset_id: Option<i32>,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<i64>,
    pub last_error_message: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
