use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "responses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub response_set_id: i32,
    pub question_id: i32,
    pub answer_id: i32,
    #[sea_orm(nullable)]
    pub string_value: Option<String>,
    #[sea_orm(nullable)]
    pub text_value: Option<String>,
    #[sea_orm(nullable)]
    pub response_group: Option<i32>, // repeater questions only
    pub url_checked: bool,
    pub error: bool,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::response_set::Entity",
        from = "Column::ResponseSetId",
        to = "super::response_set::Column::Id"
    )]
    ResponseSet,
    #[sea_orm(
        belongs_to = "super::answer::Entity",
        from = "Column::AnswerId",
        to = "super::answer::Column::Id"
    )]
    Answer,
}

impl Related<super::response_set::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResponseSet.def()
    }
}

impl Related<super::answer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Answer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Free-text payload, whichever column it was stored under.
    pub fn value(&self) -> Option<&str> {
        self.string_value
            .as_deref()
            .or(self.text_value.as_deref())
    }
}
