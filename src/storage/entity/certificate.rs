use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "certificates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub response_set_id: i32,
    pub published: bool,
    #[sea_orm(nullable)]
    pub published_at: Option<i64>,
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
}

impl Related<super::response_set::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ResponseSet.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
