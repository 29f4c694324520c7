use crate::storage::entity::user::{self, ActiveModel as UserActiveModel, Entity as User};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub encrypted_password: String,
    pub admin: bool,
    /// Accounts created on someone's behalf are stamped confirmed so no
    /// confirmation mail goes out.
    pub skip_confirmation: bool,
}

pub struct UserRepository;

impl UserRepository {
    pub async fn find(
        db: &DatabaseConnection,
        id: i32,
    ) -> Result<Option<user::Model>, sea_orm::DbErr> {
        User::find_by_id(id).one(db).await
    }

    pub async fn find_by_email(
        db: &DatabaseConnection,
        email: &str,
    ) -> Result<Option<user::Model>, sea_orm::DbErr> {
        User::find()
            .filter(user::Column::Email.eq(email.trim().to_lowercase()))
            .one(db)
            .await
    }

    /// Plain insert. A duplicate email surfaces as a unique-constraint `DbErr`.
    pub async fn create(
        db: &DatabaseConnection,
        new: NewUser,
    ) -> Result<user::Model, sea_orm::DbErr> {
        let now = Utc::now().timestamp_micros();
        UserActiveModel {
            email: Set(new.email.trim().to_lowercase()),
            name: Set(new.name),
            encrypted_password: Set(new.encrypted_password),
            admin: Set(new.admin),
            confirmed_at: Set(new.skip_confirmation.then_some(now)),
            default_jurisdiction: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }
}
