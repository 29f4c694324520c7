use crate::storage::entity::response::{
    self, ActiveModel as ResponseActiveModel, Entity as Response,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewResponse {
    pub question_id: i32,
    pub answer_id: i32,
    pub string_value: Option<String>,
    pub text_value: Option<String>,
    pub response_group: Option<i32>,
}

pub struct ResponseRepository;

impl ResponseRepository {
    pub async fn create(
        db: &DatabaseConnection,
        response_set_id: i32,
        new: NewResponse,
    ) -> Result<response::Model, sea_orm::DbErr> {
        let now = Utc::now().timestamp_micros();
        ResponseActiveModel {
            response_set_id: Set(response_set_id),
            question_id: Set(new.question_id),
            answer_id: Set(new.answer_id),
            string_value: Set(new.string_value),
            text_value: Set(new.text_value),
            response_group: Set(new.response_group),
            url_checked: Set(false),
            error: Set(false),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
    }

    pub async fn delete_for_question(
        db: &DatabaseConnection,
        response_set_id: i32,
        question_id: i32,
    ) -> Result<u64, sea_orm::DbErr> {
        let res = Response::delete_many()
            .filter(response::Column::ResponseSetId.eq(response_set_id))
            .filter(response::Column::QuestionId.eq(question_id))
            .exec(db)
            .await?;
        Ok(res.rows_affected)
    }

    /// All responses of a set in creation order.
    pub async fn for_response_set(
        db: &DatabaseConnection,
        response_set_id: i32,
    ) -> Result<Vec<response::Model>, sea_orm::DbErr> {
        Response::find()
            .filter(response::Column::ResponseSetId.eq(response_set_id))
            .order_by_asc(response::Column::CreatedAt)
            .order_by_asc(response::Column::Id)
            .all(db)
            .await
    }

    pub async fn for_question(
        db: &DatabaseConnection,
        response_set_id: i32,
        question_id: i32,
    ) -> Result<Vec<response::Model>, sea_orm::DbErr> {
        Response::find()
            .filter(response::Column::ResponseSetId.eq(response_set_id))
            .filter(response::Column::QuestionId.eq(question_id))
            .order_by_asc(response::Column::Id)
            .all(db)
            .await
    }

    pub async fn record_url_check(
        db: &DatabaseConnection,
        id: i32,
        resolves: bool,
    ) -> Result<(), sea_orm::DbErr> {
        Response::update_many()
            .col_expr(response::Column::UrlChecked, Expr::value(true))
            .col_expr(response::Column::Error, Expr::value(!resolves))
            .filter(response::Column::Id.eq(id))
            .exec(db)
            .await?;
        Ok(())
    }
}
