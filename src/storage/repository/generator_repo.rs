use crate::storage::entity::certificate_generator::{
    self, ActiveModel as GeneratorActiveModel, Entity as CertificateGenerator,
};
use crate::storage::entity::response_set::{self, Entity as ResponseSet};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde_json::Value;

#[derive(Debug, Clone, Default)]
pub struct NewGenerator {
    pub user_id: i32,
    pub response_set_id: Option<i32>,
    pub certification_campaign_id: Option<i32>,
    pub request: Value,
    pub status: GeneratorStatus,
    pub jurisdiction: Option<String>,
    pub create_user: bool,
    pub existing_dataset_id: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GeneratorStatus {
    /// Driven synchronously by a caller, never picked up by workers.
    #[default]
    Created,
    Queued,
    Claimed,
    Done,
    Failed,
}

impl GeneratorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeneratorStatus::Created => "CREATED",
            GeneratorStatus::Queued => "QUEUED",
            GeneratorStatus::Claimed => "CLAIMED",
            GeneratorStatus::Done => "DONE",
            GeneratorStatus::Failed => "FAILED",
        }
    }
}

pub struct GeneratorRepository;

impl GeneratorRepository {
    pub async fn create(
        db: &DatabaseConnection,
        new: NewGenerator,
    ) -> Result<certificate_generator::Model, sea_orm::DbErr> {
        let now = Utc::now().timestamp_micros();
        GeneratorActiveModel {
            user_id: Set(new.user_id),
            response_set_id: Set(new.response_set_id),
            certification_campaign_id: Set(new.certification_campaign_id),
            request: Set(new.request.to_string()),
            completed: Set(false),
            status: Set(new.status.as_str().to_string()),
            jurisdiction: Set(new.jurisdiction),
            create_user: Set(new.create_user),
            existing_dataset_id: Set(new.existing_dataset_id),
            claimed_by: Set(None),
            claimed_at: Set(None),
            last_error_message: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn find(
        db: &DatabaseConnection,
        id: i32,
    ) -> Result<Option<certificate_generator::Model>, sea_orm::DbErr> {
        CertificateGenerator::find_by_id(id).one(db).await
    }

    pub async fn for_response_set(
        db: &DatabaseConnection,
        response_set_id: i32,
    ) -> Result<Option<certificate_generator::Model>, sea_orm::DbErr> {
        CertificateGenerator::find()
            .filter(certificate_generator::Column::ResponseSetId.eq(response_set_id))
            .order_by_desc(certificate_generator::Column::Id)
            .one(db)
            .await
    }

    /// Latest generator whose response set belongs to the dataset.
    pub async fn latest_for_dataset(
        db: &DatabaseConnection,
        dataset_id: i32,
    ) -> Result<Option<certificate_generator::Model>, sea_orm::DbErr> {
        let set_ids: Vec<i32> = ResponseSet::find()
            .select_only()
            .column(response_set::Column::Id)
            .filter(response_set::Column::DatasetId.eq(dataset_id))
            .into_tuple()
            .all(db)
            .await?;
        if set_ids.is_empty() {
            return Ok(None);
        }
        CertificateGenerator::find()
            .filter(certificate_generator::Column::ResponseSetId.is_in(set_ids))
            .order_by_desc(certificate_generator::Column::CreatedAt)
            .order_by_desc(certificate_generator::Column::Id)
            .one(db)
            .await
    }

    pub async fn set_request(
        db: &DatabaseConnection,
        id: i32,
        request: &Value,
    ) -> Result<(), sea_orm::DbErr> {
        GeneratorActiveModel {
            id: Set(id),
            request: Set(request.to_string()),
            updated_at: Set(Utc::now().timestamp_micros()),
            ..Default::default()
        }
        .update(db)
        .await?;
        Ok(())
    }

    pub async fn attach_response_set(
        db: &DatabaseConnection,
        id: i32,
        response_set_id: i32,
    ) -> Result<(), sea_orm::DbErr> {
        GeneratorActiveModel {
            id: Set(id),
            response_set_id: Set(Some(response_set_id)),
            updated_at: Set(Utc::now().timestamp_micros()),
            ..Default::default()
        }
        .update(db)
        .await?;
        Ok(())
    }

    pub async fn mark_completed(db: &DatabaseConnection, id: i32) -> Result<(), sea_orm::DbErr> {
        GeneratorActiveModel {
            id: Set(id),
            completed: Set(true),
            updated_at: Set(Utc::now().timestamp_micros()),
            ..Default::default()
        }
        .update(db)
        .await?;
        Ok(())
    }

    /// Atomically claims the oldest queued generator for `worker_id`.
    pub async fn claim_next(
        db: &DatabaseConnection,
        worker_id: &str,
    ) -> Result<Option<certificate_generator::Model>, sea_orm::DbErr> {
        let txn = db.begin().await?;

        let picked = CertificateGenerator::find()
            .filter(certificate_generator::Column::Status.eq(GeneratorStatus::Queued.as_str()))
            .order_by_asc(certificate_generator::Column::CreatedAt)
            .order_by_asc(certificate_generator::Column::Id)
            .one(&txn)
            .await?;

        let Some(job) = picked else {
            txn.commit().await?;
            return Ok(None);
        };

        let now = Utc::now().timestamp_micros();
        let res = CertificateGenerator::update_many()
            .col_expr(
                certificate_generator::Column::Status,
                Expr::value(GeneratorStatus::Claimed.as_str()),
            )
            .col_expr(
                certificate_generator::Column::ClaimedBy,
                Expr::value(worker_id.to_string()),
            )
            .col_expr(certificate_generator::Column::ClaimedAt, Expr::value(now))
            .col_expr(certificate_generator::Column::UpdatedAt, Expr::value(now))
            .filter(certificate_generator::Column::Id.eq(job.id))
            .filter(certificate_generator::Column::Status.eq(GeneratorStatus::Queued.as_str()))
            .exec(&txn)
            .await?;
        let claimed = if res.rows_affected == 1 {
            CertificateGenerator::find_by_id(job.id).one(&txn).await?
        } else {
            None
        };

        txn.commit().await?;
        Ok(claimed)
    }

    pub async fn mark_status(
        db: &DatabaseConnection,
        id: i32,
        status: GeneratorStatus,
        error_message: Option<String>,
    ) -> Result<(), sea_orm::DbErr> {
        let mut update = GeneratorActiveModel {
            id: Set(id),
            status: Set(status.as_str().to_string()),
            updated_at: Set(Utc::now().timestamp_micros()),
            ..Default::default()
        };
        if let Some(m) = error_message {
            update.last_error_message = Set(Some(m));
        }
        update.update(db).await?;
        Ok(())
    }

    /// Puts generators left CLAIMED by a dead process back in the queue.
    pub async fn reset_stale(db: &DatabaseConnection) -> Result<u64, sea_orm::DbErr> {
        let now = Utc::now().timestamp_micros();
        let res = CertificateGenerator::update_many()
            .col_expr(
                certificate_generator::Column::Status,
                Expr::value(GeneratorStatus::Queued.as_str()),
            )
            .col_expr(
                certificate_generator::Column::ClaimedBy,
                Expr::value(Option::<String>::None),
            )
            .col_expr(certificate_generator::Column::UpdatedAt, Expr::value(now))
            .filter(certificate_generator::Column::Status.eq(GeneratorStatus::Claimed.as_str()))
            .exec(db)
            .await?;
        Ok(res.rows_affected)
    }
}
