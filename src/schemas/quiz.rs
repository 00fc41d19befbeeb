use serde::{Deserialize, Serialize};

use crate::domain::{Answer, Question, Quiz};

#[derive(Debug, Deserialize)]
pub(crate) struct QuizUpsert {
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) categories: Vec<i64>,
    #[serde(default)]
    pub(crate) questions: Vec<QuestionUpsert>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuestionUpsert {
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) answers: Vec<AnswerUpsert>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerUpsert {
    pub(crate) answer_text: String,
    pub(crate) is_correct: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizResponse {
    pub(crate) identifier: i64,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) owner: String,
    pub(crate) questions: Vec<QuestionResponse>,
    pub(crate) categories: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) identifier: i64,
    pub(crate) title: String,
    pub(crate) answers: Vec<AnswerResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerResponse {
    pub(crate) identifier: i64,
    pub(crate) answer_text: String,
    pub(crate) is_correct: bool,
}

impl QuizUpsert {
    /// Builds the aggregate to persist. Nested identifiers are left
    /// unassigned so the store hands out fresh ones, on update as well as
    /// create.
    pub(crate) fn into_entity(self, identifier: Option<i64>, owner: String) -> Quiz {
        Quiz {
            identifier,
            title: self.title,
            description: self.description,
            owner,
            questions: self
                .questions
                .into_iter()
                .map(|question| Question {
                    identifier: None,
                    title: question.title,
                    answers: question
                        .answers
                        .into_iter()
                        .map(|answer| Answer {
                            identifier: None,
                            answer_text: answer.answer_text,
                            is_correct: answer.is_correct,
                        })
                        .collect(),
                })
                .collect(),
            categories: self.categories,
        }
    }
}

impl QuizResponse {
    pub(crate) fn from_entity(quiz: Quiz) -> Self {
        Self {
            identifier: quiz.identifier.unwrap_or_default(),
            title: quiz.title,
            description: quiz.description,
            owner: quiz.owner,
            questions: quiz
                .questions
                .into_iter()
                .map(|question| QuestionResponse {
                    identifier: question.identifier.unwrap_or_default(),
                    title: question.title,
                    answers: question
                        .answers
                        .into_iter()
                        .map(|answer| AnswerResponse {
                            identifier: answer.identifier.unwrap_or_default(),
                            answer_text: answer.answer_text,
                            is_correct: answer.is_correct,
                        })
                        .collect(),
                })
                .collect(),
            categories: quiz.categories,
        }
    }
}
