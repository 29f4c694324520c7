use crate::storage::entity::certification_campaign::{
    self, ActiveModel as CampaignActiveModel, Entity as CertificationCampaign,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

pub struct CampaignRepository;

impl CampaignRepository {
    pub async fn create(
        db: &DatabaseConnection,
        name: &str,
        user_id: i32,
    ) -> Result<certification_campaign::Model, sea_orm::DbErr> {
        CampaignActiveModel {
            name: Set(name.to_string()),
            user_id: Set(user_id),
            duplicate_count: Set(0),
            created_at: Set(Utc::now().timestamp_micros()),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn find(
        db: &DatabaseConnection,
        id: i32,
    ) -> Result<Option<certification_campaign::Model>, sea_orm::DbErr> {
        CertificationCampaign::find_by_id(id).one(db).await
    }

    pub async fn increment_duplicate_count(
        db: &DatabaseConnection,
        id: i32,
    ) -> Result<(), sea_orm::DbErr> {
        CertificationCampaign::update_many()
            .col_expr(
                certification_campaign::Column::DuplicateCount,
                Expr::col(certification_campaign::Column::DuplicateCount).add(1),
            )
            .filter(certification_campaign::Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(())
    }
}
