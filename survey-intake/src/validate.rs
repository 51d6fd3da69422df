//! The response validator.
//!
//! Pure and synchronous: given a survey's questions and a proposed answer
//! set, either every answer is accepted or the first violated rule is
//! returned. Nothing here touches a store.

use std::collections::{HashMap, HashSet};

use survey_intake_types::{
    BOOLEAN_LITERALS, ProposedAnswer, Question, QuestionId, QuestionKind, RATING_MAX, RATING_MIN,
    ValidatedAnswer, ValidationError,
};

/// Validate a proposed answer set against the questions of its survey.
///
/// Rules are applied in order, per answer:
/// the question must belong to the survey, must not be answered twice, must
/// not be blank if required, and must match its type. Afterwards every
/// required question must have been answered.
///
/// The accepted answers come back in submission order with their text
/// unchanged.
pub fn validate_answers(
    questions: &[Question],
    answers: &[ProposedAnswer],
) -> Result<Vec<ValidatedAnswer>, ValidationError> {
    let by_id: HashMap<QuestionId, &Question> = questions.iter().map(|q| (q.id(), q)).collect();
    let mut answered = HashSet::with_capacity(answers.len());
    let mut validated = Vec::with_capacity(answers.len());

    for answer in answers {
        let question_id = answer.question_id;
        let question = by_id
            .get(&question_id)
            .copied()
            .ok_or(ValidationError::UnknownQuestion { question_id })?;

        if !answered.insert(question_id) {
            return Err(ValidationError::DuplicateAnswer { question_id });
        }

        let text = answer.text();
        check_answer(question, &text)?;

        validated.push(ValidatedAnswer {
            question_id,
            answer_text: text,
        });
    }

    if let Some(missing) = questions
        .iter()
        .find(|q| q.is_required() && !answered.contains(&q.id()))
    {
        return Err(ValidationError::RequiredQuestionUnanswered {
            question_id: missing.id(),
            question_text: missing.text().to_string(),
        });
    }

    Ok(validated)
}

/// Check one answer's text against its question.
///
/// Blank text only fails when the question is required; type rules apply to
/// any non-empty text.
pub fn check_answer(question: &Question, text: &str) -> Result<(), ValidationError> {
    let question_id = question.id();
    let question_text = || question.text().to_string();

    if question.is_required() && text.trim().is_empty() {
        return Err(ValidationError::RequiredAnswerEmpty {
            question_id,
            question_text: question_text(),
        });
    }

    if text.is_empty() {
        return Ok(());
    }

    match question.kind() {
        QuestionKind::Text => Ok(()),

        QuestionKind::SingleChoice(options) => {
            if options.contains(text) {
                Ok(())
            } else {
                Err(ValidationError::InvalidOption {
                    question_id,
                    question_text: question_text(),
                })
            }
        }

        QuestionKind::MultipleChoice(options) => {
            match text.split(',').map(str::trim).find(|o| !options.contains(o)) {
                None => Ok(()),
                Some(option) => Err(ValidationError::InvalidOptions {
                    question_id,
                    question_text: question_text(),
                    option: option.to_string(),
                }),
            }
        }

        QuestionKind::Rating => match parse_leading_int(text) {
            Some(rating) if (RATING_MIN..=RATING_MAX).contains(&rating) => Ok(()),
            _ => Err(ValidationError::InvalidRating {
                question_id,
                question_text: question_text(),
            }),
        },

        QuestionKind::Boolean => {
            let lower = text.to_lowercase();
            if BOOLEAN_LITERALS.contains(&lower.as_str()) {
                Ok(())
            } else {
                Err(ValidationError::InvalidBoolean {
                    question_id,
                    question_text: question_text(),
                })
            }
        }
    }
}

/// Read the integer at the start of `text`, ignoring whatever follows it.
///
/// `" 7"`, `"7.5"` and `"7 stars"` all read as 7; `"abc"` and `""` read as
/// nothing. Values that overflow `i64` read as nothing.
fn parse_leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let magnitude: i64 = rest[..digits].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use survey_intake_types::{ChoiceOptions, SurveyId};

    use super::*;

    const SURVEY: SurveyId = SurveyId::new(1);

    fn question(id: i64, kind: QuestionKind, required: bool) -> Question {
        Question::new(QuestionId::new(id), SURVEY, format!("Question {id}"), kind)
            .required(required)
            .at_position(id as i32)
    }

    fn choices(options: &[&str]) -> ChoiceOptions {
        ChoiceOptions::new(options.iter().copied()).unwrap()
    }

    fn answer(id: i64, text: &str) -> ProposedAnswer {
        ProposedAnswer::new(QuestionId::new(id), text)
    }

    #[test]
    fn accepts_a_complete_answer_set() {
        let questions = vec![
            question(1, QuestionKind::Text, true),
            question(2, QuestionKind::SingleChoice(choices(&["Yes", "No"])), true),
            question(3, QuestionKind::Rating, false),
            question(4, QuestionKind::Boolean, false),
        ];
        let validated = validate_answers(
            &questions,
            &[
                answer(2, "No"),
                answer(1, "hello"),
                answer(4, "YES"),
                answer(3, "10"),
            ],
        )
        .unwrap();

        let ids: Vec<i64> = validated.iter().map(|a| a.question_id.get()).collect();
        assert_eq!(ids, [2, 1, 4, 3]);
        assert_eq!(validated[2].answer_text, "YES");
    }

    #[test]
    fn omitted_optional_questions_are_simply_absent() {
        let questions = vec![
            question(1, QuestionKind::Text, true),
            question(2, QuestionKind::Text, false),
        ];
        let validated = validate_answers(&questions, &[answer(1, "only this")]).unwrap();
        assert_eq!(validated.len(), 1);
    }

    #[test]
    fn rejects_questions_from_other_surveys() {
        let questions = vec![question(1, QuestionKind::Text, false)];
        assert_eq!(
            validate_answers(&questions, &[answer(99, "x")]),
            Err(ValidationError::UnknownQuestion {
                question_id: QuestionId::new(99)
            })
        );
    }

    #[test]
    fn rejects_duplicate_answers() {
        let questions = vec![question(1, QuestionKind::Text, false)];
        assert_eq!(
            validate_answers(&questions, &[answer(1, "a"), answer(1, "b")]),
            Err(ValidationError::DuplicateAnswer {
                question_id: QuestionId::new(1)
            })
        );
    }

    #[test]
    fn unknown_question_is_reported_before_later_duplicates() {
        let questions = vec![question(1, QuestionKind::Text, false)];
        let err =
            validate_answers(&questions, &[answer(7, "x"), answer(1, "a"), answer(1, "b")])
                .unwrap_err();
        assert!(matches!(err, ValidationError::UnknownQuestion { .. }));
    }

    #[test]
    fn blank_required_answer_is_rejected() {
        let q = question(1, QuestionKind::Text, true);
        assert!(matches!(
            check_answer(&q, "   "),
            Err(ValidationError::RequiredAnswerEmpty { .. })
        ));
        let blank = ProposedAnswer::blank(QuestionId::new(1));
        assert!(matches!(
            validate_answers(&[q], &[blank]),
            Err(ValidationError::RequiredAnswerEmpty { .. })
        ));
    }

    #[test]
    fn empty_optional_answer_skips_type_checks() {
        let q = question(1, QuestionKind::Rating, false);
        assert_eq!(check_answer(&q, ""), Ok(()));
        let q = question(2, QuestionKind::SingleChoice(choices(&["A", "B"])), false);
        assert_eq!(check_answer(&q, ""), Ok(()));
    }

    #[test]
    fn single_choice_must_match_exactly() {
        let q = question(1, QuestionKind::SingleChoice(choices(&["Yes", "No"])), true);
        assert_eq!(check_answer(&q, "Yes"), Ok(()));
        assert!(check_answer(&q, "yes").is_err());
        assert!(check_answer(&q, " Yes").is_err());
        assert!(matches!(
            check_answer(&q, "Maybe"),
            Err(ValidationError::InvalidOption { .. })
        ));
    }

    #[test]
    fn multiple_choice_checks_every_trimmed_token() {
        let q = question(1, QuestionKind::MultipleChoice(choices(&["A", "B", "C"])), false);
        assert_eq!(check_answer(&q, "A, C"), Ok(()));
        assert_eq!(check_answer(&q, "B"), Ok(()));
        assert_eq!(
            check_answer(&q, "A, D"),
            Err(ValidationError::InvalidOptions {
                question_id: QuestionId::new(1),
                question_text: "Question 1".to_string(),
                option: "D".to_string(),
            })
        );
        // a trailing comma leaves an empty token
        assert!(check_answer(&q, "A,").is_err());
    }

    #[test]
    fn rating_must_be_between_one_and_ten() {
        let q = question(1, QuestionKind::Rating, true);
        for ok in ["1", "7", "10", " 5", "7.5"] {
            assert_eq!(check_answer(&q, ok), Ok(()), "{ok}");
        }
        for bad in ["0", "11", "-1", "abc", "99999999999999999999"] {
            assert!(
                matches!(
                    check_answer(&q, bad),
                    Err(ValidationError::InvalidRating { .. })
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn boolean_accepts_common_spellings() {
        let q = question(1, QuestionKind::Boolean, true);
        for ok in ["true", "False", "YES", "no", "1", "0"] {
            assert_eq!(check_answer(&q, ok), Ok(()), "{ok}");
        }
        assert!(matches!(
            check_answer(&q, "maybe"),
            Err(ValidationError::InvalidBoolean { .. })
        ));
    }

    #[test]
    fn missing_required_question_is_named() {
        let questions = vec![
            question(1, QuestionKind::Text, false),
            question(2, QuestionKind::Boolean, true),
        ];
        assert_eq!(
            validate_answers(&questions, &[answer(1, "hi")]),
            Err(ValidationError::RequiredQuestionUnanswered {
                question_id: QuestionId::new(2),
                question_text: "Question 2".to_string(),
            })
        );
    }

    #[test]
    fn parse_leading_int_follows_prefix_rule() {
        assert_eq!(parse_leading_int("42abc"), Some(42));
        assert_eq!(parse_leading_int("+3"), Some(3));
        assert_eq!(parse_leading_int("-3"), Some(-3));
        assert_eq!(parse_leading_int("-"), None);
        assert_eq!(parse_leading_int(""), None);
    }
}
