use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "response_sets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub access_code: String,
    pub survey_id: i32,
    #[sea_orm(nullable)]
    pub user_id: Option<i32>,
    #[sea_orm(nullable)]
    pub dataset_id: Option<i32>,
    pub state: String, // draft/complete/published/superseded
    pub removed: bool,
    #[sea_orm(nullable)]
    pub kitten_data: Option<String>, // JSON from auto-population
    #[sea_orm(nullable)]
    pub completed_at: Option<i64>,
    #[sea_orm(nullable)]
    pub published_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::survey::Entity",
        from = "Column::SurveyId",
        to = "super::survey::Column::Id"
    )]
    Survey,
    #[sea_orm(has_many = "super::response::Entity")]
    Response,
    #[sea_orm(has_one = "super::certificate::Entity")]
    Certificate,
}

impl Related<super::response::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Response.def()
    }
}

impl Related<super::certificate::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Certificate.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn lifecycle(&self) -> crate::error::EngineResult<crate::response_set::ResponseSetState> {
        self.state.parse()
    }

    /// Answers may only change while the set is a live draft.
    pub fn modifications_allowed(&self) -> bool {
        !self.removed && matches!(self.lifecycle(), Ok(s) if s.is_draft())
    }

    pub fn is_published(&self) -> bool {
        self.state == "published"
    }
}
