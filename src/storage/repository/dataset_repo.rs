use crate::storage::entity::dataset::{
    self, ActiveModel as DatasetActiveModel, Entity as Dataset,
};
use crate::storage::repository::ResponseSetRepository;
use chrono::Utc;
use log::info;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

pub struct DatasetRepository;

impl DatasetRepository {
    pub async fn create(
        db: &DatabaseConnection,
        user_id: Option<i32>,
        documentation_url: Option<String>,
    ) -> Result<dataset::Model, sea_orm::DbErr> {
        let now = Utc::now().timestamp_micros();
        DatasetActiveModel {
            title: Set(None),
            curator: Set(None),
            documentation_url: Set(documentation_url),
            user_id: Set(user_id),
            removed: Set(false),
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
    ) -> Result<Option<dataset::Model>, sea_orm::DbErr> {
        Dataset::find_by_id(id).one(db).await
    }

    pub async fn find_by_documentation_url(
        db: &DatabaseConnection,
        url: &str,
    ) -> Result<Option<dataset::Model>, sea_orm::DbErr> {
        Dataset::find()
            .filter(dataset::Column::DocumentationUrl.eq(url))
            .filter(dataset::Column::Removed.eq(false))
            .order_by_asc(dataset::Column::Id)
            .one(db)
            .await
    }

    pub async fn set_default_title(
        db: &DatabaseConnection,
        id: i32,
        title: &str,
    ) -> Result<(), sea_orm::DbErr> {
        Self::touch(db, id, |am| am.title = Set(Some(title.to_string()))).await
    }

    pub async fn set_default_curator(
        db: &DatabaseConnection,
        id: i32,
        curator: &str,
    ) -> Result<(), sea_orm::DbErr> {
        Self::touch(db, id, |am| am.curator = Set(Some(curator.to_string()))).await
    }

    pub async fn set_default_documentation_url(
        db: &DatabaseConnection,
        id: i32,
        url: &str,
    ) -> Result<(), sea_orm::DbErr> {
        Self::touch(db, id, |am| am.documentation_url = Set(Some(url.to_string()))).await
    }

    /// Gives an unowned dataset an owner; existing ownership is kept.
    pub async fn claim_owner(
        db: &DatabaseConnection,
        id: i32,
        user_id: i32,
    ) -> Result<(), sea_orm::DbErr> {
        if let Some(existing) = Self::find(db, id).await? {
            if existing.user_id.is_none() {
                Self::touch(db, id, |am| am.user_id = Set(Some(user_id))).await?;
            }
        }
        Ok(())
    }

    async fn touch<F>(db: &DatabaseConnection, id: i32, apply: F) -> Result<(), sea_orm::DbErr>
    where
        F: FnOnce(&mut DatasetActiveModel),
    {
        let mut am = DatasetActiveModel {
            id: Set(id),
            updated_at: Set(Utc::now().timestamp_micros()),
            ..Default::default()
        };
        apply(&mut am);
        am.update(db).await?;
        Ok(())
    }

    /// Deletes the dataset when nothing was ever answered for it.
    pub async fn destroy_if_no_responses(
        db: &DatabaseConnection,
        id: i32,
    ) -> Result<bool, sea_orm::DbErr> {
        if ResponseSetRepository::count_for_dataset(db, id).await? > 0 {
            return Ok(false);
        }
        let res = Dataset::delete_by_id(id).exec(db).await?;
        if res.rows_affected > 0 {
            info!("Removed empty dataset {}", id);
        }
        Ok(res.rows_affected > 0)
    }

    pub fn api_url(public_host: &str, id: i32) -> String {
        format!("{}/datasets/{}.json", public_host.trim_end_matches('/'), id)
    }
}
