use super::payload::FieldValue;
use crate::catalog::{CatalogQuestion, QuestionType};
use crate::error::EngineResult;
use crate::storage::entity::{answer, response};
use crate::storage::repository::{NewResponse, ResponseRepository};
use log::{debug, warn};
use sea_orm::DatabaseConnection;

/// Builds the response rows a field value implies for one question.
///
/// Choice misses are dropped silently; free-text questions always produce
/// rows for the values they are given.
pub fn plan_responses(
    question: &CatalogQuestion,
    value: &FieldValue,
) -> EngineResult<Vec<NewResponse>> {
    let kind = question.question_type()?;
    let reference = question.reference_identifier();

    let planned = match (kind, value) {
        (QuestionType::None, FieldValue::Text(text)) => {
            vec![free_text(question, question.sole_answer()?, text, None)]
        }
        (QuestionType::One, FieldValue::Text(choice)) => question
            .answer_by_reference(choice)
            .map(|a| vec![choice_of(question, a)])
            .unwrap_or_default(),
        (QuestionType::Any, FieldValue::Text(choice)) => {
            choices(question, std::slice::from_ref(choice))
        }
        (QuestionType::Any, FieldValue::List(chosen)) => choices(question, chosen),
        (QuestionType::Repeater, FieldValue::Text(text)) => {
            vec![free_text(question, question.sole_answer()?, text, Some(0))]
        }
        (QuestionType::Repeater, FieldValue::List(values)) => {
            let answer = question.sole_answer()?;
            values
                .iter()
                .enumerate()
                .map(|(group, text)| free_text(question, answer, text, Some(group as i32)))
                .collect()
        }
        (_, FieldValue::Cleared) => {
            debug!("Clearing responses for '{}'", reference);
            Vec::new()
        }
        (kind, _) => {
            warn!(
                "Dropping value for '{}': shape does not fit a {} question",
                reference, kind
            );
            Vec::new()
        }
    };

    Ok(planned)
}

fn free_text(
    question: &CatalogQuestion,
    answer: &answer::Model,
    text: &str,
    response_group: Option<i32>,
) -> NewResponse {
    let (string_value, text_value) = match answer.response_class.as_str() {
        "text" => (None, Some(text.to_string())),
        _ => (Some(text.to_string()), None),
    };
    NewResponse {
        question_id: question.id(),
        answer_id: answer.id,
        string_value,
        text_value,
        response_group,
    }
}

fn choice_of(question: &CatalogQuestion, answer: &answer::Model) -> NewResponse {
    NewResponse {
        question_id: question.id(),
        answer_id: answer.id,
        ..Default::default()
    }
}

/// Chosen options in catalog order, whatever order the request lists them in.
fn choices(question: &CatalogQuestion, chosen: &[String]) -> Vec<NewResponse> {
    for reference in chosen {
        if question.answer_by_reference(reference).is_none() {
            debug!(
                "'{}' is not an option of '{}', skipped",
                reference,
                question.reference_identifier()
            );
        }
    }
    question
        .answers
        .iter()
        .filter(|a| chosen.iter().any(|c| *c == a.reference_identifier))
        .map(|a| choice_of(question, a))
        .collect()
}

/// Replaces every response of `question` in the set with the ones `value`
/// implies. Re-answering is a full replace, never a merge.
pub async fn resolve(
    db: &DatabaseConnection,
    response_set_id: i32,
    question: &CatalogQuestion,
    value: &FieldValue,
) -> EngineResult<Vec<response::Model>> {
    let planned = plan_responses(question, value)?;

    ResponseRepository::delete_for_question(db, response_set_id, question.id()).await?;

    let mut created = Vec::with_capacity(planned.len());
    for new in planned {
        created.push(ResponseRepository::create(db, response_set_id, new).await?);
    }
    debug!(
        "Resolved '{}' into {} response(s) on set {}",
        question.reference_identifier(),
        created.len(),
        response_set_id
    );
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::storage::entity::question;

    fn answer(id: i32, reference: &str, response_class: &str) -> answer::Model {
        answer::Model {
            id,
            question_id: 1,
            reference_identifier: reference.to_string(),
            text: reference.to_uppercase(),
            response_class: response_class.to_string(),
            input_type: None,
            display_order: id,
        }
    }

    fn question_of(kind: &str, answers: Vec<answer::Model>) -> CatalogQuestion {
        CatalogQuestion {
            question: question::Model {
                id: 1,
                survey_id: 1,
                section_id: 1,
                reference_identifier: "q".to_string(),
                text: "Q".to_string(),
                question_type: kind.to_string(),
                display_type: None,
                is_mandatory: false,
                display_order: 0,
            },
            answers,
        }
    }

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    fn list(items: &[&str]) -> FieldValue {
        FieldValue::List(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn none_stores_text_under_the_answer_value_key() {
        let q = question_of("none", vec![answer(10, "1", "string")]);
        let planned = plan_responses(&q, &text("Bus stops")).unwrap();
        assert_eq!(
            planned,
            vec![NewResponse {
                question_id: 1,
                answer_id: 10,
                string_value: Some("Bus stops".into()),
                text_value: None,
                response_group: None,
            }]
        );

        let q = question_of("none", vec![answer(11, "1", "text")]);
        let planned = plan_responses(&q, &text("long notes")).unwrap();
        assert_eq!(planned[0].text_value.as_deref(), Some("long notes"));
        assert_eq!(planned[0].string_value, None);
    }

    #[test]
    fn one_and_any_drop_unknown_options() {
        let options = vec![answer(1, "yes", "answer"), answer(2, "no", "answer")];

        let q = question_of("one", options.clone());
        assert!(plan_responses(&q, &text("maybe")).unwrap().is_empty());
        assert_eq!(plan_responses(&q, &text("no")).unwrap()[0].answer_id, 2);

        let q = question_of("any", options);
        assert!(plan_responses(&q, &list(&["maybe", "perhaps"]))
            .unwrap()
            .is_empty());
        let picked: Vec<i32> = plan_responses(&q, &list(&["no", "maybe", "yes"]))
            .unwrap()
            .iter()
            .map(|r| r.answer_id)
            .collect();
        assert_eq!(picked, vec![1, 2]);
    }

    #[test]
    fn cleared_value_plans_no_rows() {
        let q = question_of("repeater", vec![answer(5, "1", "string")]);
        assert!(plan_responses(&q, &FieldValue::Cleared).unwrap().is_empty());
    }

    #[test]
    fn any_accepts_a_single_choice() {
        let q = question_of("any", vec![answer(1, "one", "answer")]);
        assert_eq!(plan_responses(&q, &text("one")).unwrap().len(), 1);
    }

    #[test]
    fn repeater_numbers_groups_in_input_order() {
        let q = question_of("repeater", vec![answer(5, "1", "string")]);
        let planned = plan_responses(&q, &list(&["c", "a", "b"])).unwrap();

        let groups: Vec<(Option<i32>, Option<String>)> = planned
            .into_iter()
            .map(|r| (r.response_group, r.string_value))
            .collect();
        assert_eq!(
            groups,
            vec![
                (Some(0), Some("c".to_string())),
                (Some(1), Some("a".to_string())),
                (Some(2), Some("b".to_string())),
            ]
        );
    }

    #[test]
    fn mismatched_shapes_produce_nothing() {
        let q = question_of("none", vec![answer(1, "1", "string")]);
        assert!(plan_responses(&q, &list(&["a", "b"])).unwrap().is_empty());

        let q = question_of("one", vec![answer(1, "yes", "answer")]);
        assert!(plan_responses(&q, &list(&["yes"])).unwrap().is_empty());
    }

    #[test]
    fn unknown_question_type_is_fatal() {
        let q = question_of("grid", vec![answer(1, "1", "string")]);
        assert!(matches!(
            plan_responses(&q, &text("x")),
            Err(EngineError::UnhandledQuestionType(_))
        ));
    }

    #[test]
    fn free_text_question_without_answer_is_corrupt() {
        let q = question_of("none", vec![]);
        assert!(matches!(
            plan_responses(&q, &text("x")),
            Err(EngineError::MissingAnswer(_))
        ));
    }

    #[tokio::test]
    async fn re_resolving_leaves_no_residue() {
        use crate::catalog::{MigrationTable, SurveyCatalog};
        use crate::storage::repository::{NewResponseSet, ResponseSetRepository};
        use crate::test_support::{seed_survey, test_db};

        let db = test_db().await;
        let survey = seed_survey(&db).await;
        let catalog = SurveyCatalog::new(db.clone(), MigrationTable::default());
        let questions = catalog.questions(survey.id).await.unwrap();
        let q = questions
            .iter()
            .find(|q| q.reference_identifier() == "chooseAny")
            .unwrap();
        let rs = ResponseSetRepository::create(
            &db,
            NewResponseSet {
                survey_id: survey.id,
                ..Default::default()
            },
        )
        .await
        .unwrap();

        resolve(&db, rs.id, q, &list(&["one", "two", "three"]))
            .await
            .unwrap();
        resolve(&db, rs.id, q, &list(&["two"])).await.unwrap();

        let stored = ResponseRepository::for_question(&db, rs.id, q.id())
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(
            Some(stored[0].answer_id),
            q.answer_by_reference("two").map(|a| a.id)
        );

        // a miss still clears the earlier answer
        resolve(&db, rs.id, q, &text("nope")).await.unwrap();
        assert!(ResponseRepository::for_question(&db, rs.id, q.id())
            .await
            .unwrap()
            .is_empty());
    }
}
