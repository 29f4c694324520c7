use crate::storage::entity::certificate::{
    self, ActiveModel as CertificateActiveModel, Entity as Certificate,
};
use crate::storage::entity::response_set::{
    self, ActiveModel as ResponseSetActiveModel, Entity as ResponseSet,
};
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

#[derive(Debug, Clone, Default)]
pub struct NewResponseSet {
    pub survey_id: i32,
    pub user_id: Option<i32>,
    pub dataset_id: Option<i32>,
}

pub struct ResponseSetRepository;

impl ResponseSetRepository {
    fn generate_access_code() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(12)
            .map(|c| (c as char).to_ascii_lowercase())
            .collect()
    }

    /// Inserts a draft response set together with its (unpublished) certificate.
    pub async fn create(
        db: &DatabaseConnection,
        attrs: NewResponseSet,
    ) -> Result<response_set::Model, sea_orm::DbErr> {
        let now = Utc::now().timestamp_micros();
        let txn = db.begin().await?;

        let created = ResponseSetActiveModel {
            access_code: Set(Self::generate_access_code()),
            survey_id: Set(attrs.survey_id),
            user_id: Set(attrs.user_id),
            dataset_id: Set(attrs.dataset_id),
            state: Set("draft".to_string()),
            removed: Set(false),
            kitten_data: Set(None),
            completed_at: Set(None),
            published_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        CertificateActiveModel {
            response_set_id: Set(created.id),
            published: Set(false),
            published_at: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(created)
    }

    pub async fn find(
        db: &DatabaseConnection,
        id: i32,
    ) -> Result<Option<response_set::Model>, sea_orm::DbErr> {
        ResponseSet::find_by_id(id).one(db).await
    }

    /// Most recent live response set for a dataset, optionally restricted to one user.
    pub async fn latest_for_dataset(
        db: &DatabaseConnection,
        dataset_id: i32,
        user_id: Option<i32>,
    ) -> Result<Option<response_set::Model>, sea_orm::DbErr> {
        let mut query = ResponseSet::find()
            .filter(response_set::Column::DatasetId.eq(dataset_id))
            .filter(response_set::Column::Removed.eq(false));
        if let Some(uid) = user_id {
            query = query.filter(response_set::Column::UserId.eq(uid));
        }
        query
            .order_by_desc(response_set::Column::CreatedAt)
            .order_by_desc(response_set::Column::Id)
            .one(db)
            .await
    }

    pub async fn latest_completed_for_dataset(
        db: &DatabaseConnection,
        dataset_id: i32,
    ) -> Result<Option<response_set::Model>, sea_orm::DbErr> {
        ResponseSet::find()
            .filter(response_set::Column::DatasetId.eq(dataset_id))
            .filter(response_set::Column::Removed.eq(false))
            .filter(response_set::Column::State.is_in(["complete", "published"]))
            .order_by_desc(response_set::Column::CreatedAt)
            .order_by_desc(response_set::Column::Id)
            .one(db)
            .await
    }

    /// "The" published response set of a dataset: the latest one to be published.
    pub async fn published_for_dataset(
        db: &DatabaseConnection,
        dataset_id: i32,
    ) -> Result<Option<response_set::Model>, sea_orm::DbErr> {
        ResponseSet::find()
            .filter(response_set::Column::DatasetId.eq(dataset_id))
            .filter(response_set::Column::Removed.eq(false))
            .filter(response_set::Column::State.eq("published"))
            .order_by_desc(response_set::Column::PublishedAt)
            .order_by_desc(response_set::Column::Id)
            .one(db)
            .await
    }

    pub async fn count_for_dataset(
        db: &DatabaseConnection,
        dataset_id: i32,
    ) -> Result<u64, sea_orm::DbErr> {
        use sea_orm::PaginatorTrait;

        ResponseSet::find()
            .filter(response_set::Column::DatasetId.eq(dataset_id))
            .count(db)
            .await
    }

    /// Compare-and-set on the state column. Returns false when the row was not
    /// in `from` any more.
    pub async fn transition<C: ConnectionTrait>(
        db: &C,
        id: i32,
        from: &str,
        to: &str,
    ) -> Result<bool, sea_orm::DbErr> {
        let now = Utc::now().timestamp_micros();
        let mut update = ResponseSet::update_many()
            .col_expr(response_set::Column::State, Expr::value(to.to_string()))
            .col_expr(response_set::Column::UpdatedAt, Expr::value(now));
        match to {
            "complete" => {
                update = update.col_expr(response_set::Column::CompletedAt, Expr::value(now));
            }
            "published" => {
                update = update.col_expr(response_set::Column::PublishedAt, Expr::value(now));
            }
            _ => {}
        }
        let res = update
            .filter(response_set::Column::Id.eq(id))
            .filter(response_set::Column::State.eq(from))
            .exec(db)
            .await?;
        Ok(res.rows_affected == 1)
    }

    pub async fn assign_user(
        db: &DatabaseConnection,
        id: i32,
        user_id: i32,
    ) -> Result<(), sea_orm::DbErr> {
        let now = Utc::now().timestamp_micros();
        ResponseSetActiveModel {
            id: Set(id),
            user_id: Set(Some(user_id)),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(db)
        .await?;
        Ok(())
    }

    pub async fn set_dataset(
        db: &DatabaseConnection,
        id: i32,
        dataset_id: i32,
    ) -> Result<(), sea_orm::DbErr> {
        let now = Utc::now().timestamp_micros();
        ResponseSetActiveModel {
            id: Set(id),
            dataset_id: Set(Some(dataset_id)),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(db)
        .await?;
        Ok(())
    }

    pub async fn set_kitten_data(
        db: &DatabaseConnection,
        id: i32,
        kitten_json: String,
    ) -> Result<(), sea_orm::DbErr> {
        let now = Utc::now().timestamp_micros();
        ResponseSetActiveModel {
            id: Set(id),
            kitten_data: Set(Some(kitten_json)),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(db)
        .await?;
        Ok(())
    }

    pub async fn certificate_for(
        db: &DatabaseConnection,
        response_set_id: i32,
    ) -> Result<Option<certificate::Model>, sea_orm::DbErr> {
        Certificate::find()
            .filter(certificate::Column::ResponseSetId.eq(response_set_id))
            .one(db)
            .await
    }

    pub async fn publish_certificate<C: ConnectionTrait>(
        db: &C,
        response_set_id: i32,
    ) -> Result<(), sea_orm::DbErr> {
        let now = Utc::now().timestamp_micros();
        Certificate::update_many()
            .col_expr(certificate::Column::Published, Expr::value(true))
            .col_expr(certificate::Column::PublishedAt, Expr::value(now))
            .filter(certificate::Column::ResponseSetId.eq(response_set_id))
            .filter(certificate::Column::Published.eq(false))
            .exec(db)
            .await?;
        Ok(())
    }
}
