pub mod password;

use crate::autopopulate::{Contact, KittenData};
use crate::error::{EngineError, EngineResult};
use crate::storage::entity::{response_set, user};
use crate::storage::repository::{NewUser, UserRepository};
use log::{debug, info};
use sea_orm::{DatabaseConnection, SqlErr};
use std::sync::Arc;

pub struct UserResolver {
    db: Arc<DatabaseConnection>,
}

impl UserResolver {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Owner of a generated certificate.
    ///
    /// Contacts from the set's kitten data are tried in order: an existing
    /// account wins, otherwise (with `create_user`) one is created for the
    /// first contact. Falls back to the submitting user.
    pub async fn determine_user(
        &self,
        rs: &response_set::Model,
        create_user: bool,
        fallback_user_id: i32,
    ) -> EngineResult<user::Model> {
        let contacts = KittenData::from_json(rs.kitten_data.as_deref()).contacts_with_email();

        for contact in &contacts {
            if let Some(existing) = UserRepository::find_by_email(&self.db, &contact.email).await? {
                debug!("Contact {} matches user {}", contact.email, existing.id);
                return Ok(existing);
            }
        }

        if create_user {
            if let Some(first) = contacts.first() {
                return self.create_or_refetch(first).await;
            }
        }

        UserRepository::find(&self.db, fallback_user_id)
            .await?
            .ok_or(EngineError::UserNotFound(fallback_user_id))
    }

    pub async fn find_or_create_by_email(&self, contact: &Contact) -> EngineResult<user::Model> {
        if let Some(existing) = UserRepository::find_by_email(&self.db, &contact.email).await? {
            return Ok(existing);
        }
        self.create_or_refetch(contact).await
    }

    /// Inserts an account for `contact`. Losing a creation race to another
    /// writer is expected: the account holding the email afterwards is the
    /// answer.
    async fn create_or_refetch(&self, contact: &Contact) -> EngineResult<user::Model> {
        let new = NewUser {
            email: contact.email.clone(),
            name: contact.name.clone(),
            encrypted_password: password::digest_password(&password::generate_password()),
            admin: false,
            skip_confirmation: true,
        };
        match UserRepository::create(&self.db, new).await {
            Ok(created) => {
                info!("Created user {} for contact {}", created.id, created.email);
                Ok(created)
            }
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                info!("User {} appeared concurrently, re-fetching", contact.email);
                UserRepository::find_by_email(&self.db, &contact.email)
                    .await?
                    .ok_or(EngineError::Db(e))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::entity::user::{self as user_entity, Entity as User};
    use crate::storage::repository::{NewResponseSet, ResponseSetRepository};
    use crate::test_support::{seed_survey, seed_user, test_db};
    use futures::future::join_all;
    use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

    const KITTEN: &str = r#"{
        "publishers": [{"name": "Publisher", "mbox": "publisher@example.org"}],
        "contacts": [{"name": "Team", "mbox": "team@example.org"}]
    }"#;

    async fn response_set_with(
        db: &Arc<DatabaseConnection>,
        kitten: Option<&str>,
    ) -> response_set::Model {
        let survey = seed_survey(db).await;
        let rs = ResponseSetRepository::create(
            db,
            NewResponseSet {
                survey_id: survey.id,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        if let Some(k) = kitten {
            ResponseSetRepository::set_kitten_data(db, rs.id, k.to_string())
                .await
                .unwrap();
        }
        ResponseSetRepository::find(db, rs.id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn existing_contact_account_wins_over_creation() {
        let db = test_db().await;
        let submitter = seed_user(&db, "submitter@example.org", false).await;
        let team = seed_user(&db, "team@example.org", false).await;
        let rs = response_set_with(&db, Some(KITTEN)).await;

        let owner = UserResolver::new(db.clone())
            .determine_user(&rs, true, submitter.id)
            .await
            .unwrap();
        assert_eq!(owner.id, team.id);
        assert!(UserRepository::find_by_email(&db, "publisher@example.org")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn creates_account_for_first_contact_when_allowed() {
        let db = test_db().await;
        let submitter = seed_user(&db, "submitter@example.org", false).await;
        let rs = response_set_with(&db, Some(KITTEN)).await;

        let owner = UserResolver::new(db.clone())
            .determine_user(&rs, true, submitter.id)
            .await
            .unwrap();
        assert_eq!(owner.email, "publisher@example.org");
        assert_eq!(owner.name.as_deref(), Some("Publisher"));
        assert!(owner.confirmed_at.is_some());
        assert!(!owner.admin);
    }

    #[tokio::test]
    async fn falls_back_to_submitter() {
        let db = test_db().await;
        let submitter = seed_user(&db, "submitter@example.org", false).await;
        let resolver = UserResolver::new(db.clone());

        let with_contacts = response_set_with(&db, Some(KITTEN)).await;
        let owner = resolver
            .determine_user(&with_contacts, false, submitter.id)
            .await
            .unwrap();
        assert_eq!(owner.id, submitter.id);

        let malformed = response_set_with(&db, Some("{{nope")).await;
        let owner = resolver
            .determine_user(&malformed, true, submitter.id)
            .await
            .unwrap();
        assert_eq!(owner.id, submitter.id);
    }

    #[tokio::test]
    async fn losing_the_creation_race_returns_the_winner() {
        let db = test_db().await;
        let winner = seed_user(&db, "race@example.org", false).await;

        let contact = Contact {
            name: Some("Racer".into()),
            email: "race@example.org".into(),
        };
        let got = UserResolver::new(db.clone())
            .create_or_refetch(&contact)
            .await
            .unwrap();
        assert_eq!(got.id, winner.id);
    }

    #[tokio::test]
    async fn concurrent_find_or_create_converges_on_one_user() {
        let db = test_db().await;
        let resolver = Arc::new(UserResolver::new(db.clone()));
        let contact = Contact {
            name: None,
            email: "shared@example.org".into(),
        };

        let tasks = (0..8).map(|_| {
            let resolver = resolver.clone();
            let contact = contact.clone();
            tokio::spawn(async move { resolver.find_or_create_by_email(&contact).await })
        });
        let ids: Vec<i32> = join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap().id)
            .collect();

        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        let count = User::find()
            .filter(user_entity::Column::Email.eq("shared@example.org"))
            .count(db.as_ref())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
