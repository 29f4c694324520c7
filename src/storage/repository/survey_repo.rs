use crate::catalog::definition::SurveyDefinition;
use crate::storage::entity::answer::{self, ActiveModel as AnswerActiveModel, Entity as Answer};
use crate::storage::entity::question::{
    self, ActiveModel as QuestionActiveModel, Entity as Question,
};
use crate::storage::entity::section::{self, ActiveModel as SectionActiveModel, Entity as Section};
use crate::storage::entity::survey::{self, ActiveModel as SurveyActiveModel, Entity as Survey};
use chrono::Utc;
use log::info;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use std::collections::HashMap;

pub struct CatalogRepository;

impl CatalogRepository {
    /// Persists a survey definition as a new version of its access code.
    pub async fn import(
        db: &DatabaseConnection,
        def: &SurveyDefinition,
    ) -> Result<survey::Model, sea_orm::DbErr> {
        let now = Utc::now().timestamp_micros();
        let txn = db.begin().await?;

        let survey = SurveyActiveModel {
            title: Set(def.title.clone()),
            access_code: Set(def.access_code.clone()),
            survey_version: Set(def.survey_version),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut question_order = 0;
        for (section_idx, section_def) in def.sections.iter().enumerate() {
            let section = SectionActiveModel {
                survey_id: Set(survey.id),
                title: Set(section_def.title.clone()),
                display_order: Set(section_idx as i32),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            for question_def in &section_def.questions {
                let question = QuestionActiveModel {
                    survey_id: Set(survey.id),
                    section_id: Set(section.id),
                    reference_identifier: Set(question_def.reference_identifier.clone()),
                    text: Set(question_def.text.clone()),
                    question_type: Set(question_def.question_type.clone()),
                    display_type: Set(question_def.display_type.clone()),
                    is_mandatory: Set(question_def.is_mandatory),
                    display_order: Set(question_order),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
                question_order += 1;

                for (answer_idx, answer_def) in question_def.answers.iter().enumerate() {
                    AnswerActiveModel {
                        question_id: Set(question.id),
                        reference_identifier: Set(answer_def.reference_identifier.clone()),
                        text: Set(answer_def.text.clone()),
                        response_class: Set(answer_def.response_class.clone()),
                        input_type: Set(answer_def.input_type.clone()),
                        display_order: Set(answer_idx as i32),
                        ..Default::default()
                    }
                    .insert(&txn)
                    .await?;
                }
            }
        }

        txn.commit().await?;
        info!(
            "Imported survey '{}' [{}] as id {}",
            survey.title, survey.access_code, survey.id
        );
        Ok(survey)
    }

    /// Latest `created_at` wins; ties go to the highest id.
    pub async fn newest_for_access_code(
        db: &DatabaseConnection,
        access_code: &str,
    ) -> Result<Option<survey::Model>, sea_orm::DbErr> {
        Survey::find()
            .filter(survey::Column::AccessCode.eq(access_code))
            .order_by_desc(survey::Column::CreatedAt)
            .order_by_desc(survey::Column::Id)
            .one(db)
            .await
    }

    /// Questions in catalog order: section order first, then question order.
    pub async fn questions_in_order(
        db: &DatabaseConnection,
        survey_id: i32,
    ) -> Result<Vec<question::Model>, sea_orm::DbErr> {
        let sections = Section::find()
            .filter(section::Column::SurveyId.eq(survey_id))
            .all(db)
            .await?;
        let section_rank: HashMap<i32, i32> = sections
            .into_iter()
            .map(|s| (s.id, s.display_order))
            .collect();

        let mut questions = Question::find()
            .filter(question::Column::SurveyId.eq(survey_id))
            .order_by_asc(question::Column::DisplayOrder)
            .order_by_asc(question::Column::Id)
            .all(db)
            .await?;
        questions.sort_by_key(|q| {
            (
                section_rank.get(&q.section_id).copied().unwrap_or(i32::MAX),
                q.display_order,
                q.id,
            )
        });
        Ok(questions)
    }

    /// Answers for the given questions, grouped by question id, each list in
    /// display order.
    pub async fn answers_by_question(
        db: &DatabaseConnection,
        question_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<answer::Model>>, sea_orm::DbErr> {
        let mut grouped: HashMap<i32, Vec<answer::Model>> = HashMap::new();
        if question_ids.is_empty() {
            return Ok(grouped);
        }
        let answers = Answer::find()
            .filter(answer::Column::QuestionId.is_in(question_ids.to_vec()))
            .order_by_asc(answer::Column::DisplayOrder)
            .order_by_asc(answer::Column::Id)
            .all(db)
            .await?;
        for a in answers {
            grouped.entry(a.question_id).or_default().push(a);
        }
        Ok(grouped)
    }
}
