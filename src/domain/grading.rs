use serde::{Deserialize, Serialize};

use super::{DomainError, Quiz};

/// A learner's answer sheet for one quiz. Pure grading input; never
/// persisted.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct QuizSubmission {
    pub(crate) identifier: i64,
    #[serde(default)]
    pub(crate) questions: Vec<QuestionSubmission>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct QuestionSubmission {
    pub(crate) identifier: i64,
    #[serde(default)]
    pub(crate) answers: Vec<AnswerSubmission>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AnswerSubmission {
    pub(crate) identifier: i64,
    pub(crate) is_correct: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct ValidationResult {
    pub(crate) total_points: u32,
    pub(crate) points: u32,
}

/// Grades a submission against the stored quiz.
///
/// Every stored question and answer must be matched by identifier, else the
/// submission is structurally unmatched and no score is produced. Claiming
/// an incorrect answer as correct zeroes the reached points for the whole
/// quiz, so marking everything true reveals nothing about which picks
/// counted. `total_points` always reflects the full quiz.
pub(crate) fn grade(
    quiz: &Quiz,
    submission: &QuizSubmission,
) -> Result<ValidationResult, DomainError> {
    let total_points = quiz
        .questions
        .iter()
        .flat_map(|question| &question.answers)
        .filter(|answer| answer.is_correct)
        .count() as u32;

    let mut points = 0;
    for question in &quiz.questions {
        let submitted = submission
            .questions
            .iter()
            .find(|candidate| question.identifier == Some(candidate.identifier))
            .ok_or(DomainError::Unmatched)?;

        for answer in &question.answers {
            let marked = submitted
                .answers
                .iter()
                .find(|candidate| answer.identifier == Some(candidate.identifier))
                .ok_or(DomainError::Unmatched)?;

            if marked.is_correct && !answer.is_correct {
                return Ok(ValidationResult { total_points, points: 0 });
            }
            if marked.is_correct && answer.is_correct {
                points += 1;
            }
        }
    }

    Ok(ValidationResult { total_points, points })
}
