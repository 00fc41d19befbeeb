pub(crate) mod grading;
pub(crate) mod rules;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{Document, StoreError};

/// Error taxonomy for rule checks and grading. The API layer maps each kind
/// to a status code; the domain itself never logs.
#[derive(Debug, Error)]
pub(crate) enum DomainError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Invalid(String),
    #[error("only the quiz owner may perform this action")]
    Forbidden,
    #[error("{0}")]
    Conflict(String),
    #[error("submission does not match the quiz structure")]
    Unmatched,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Registered account. Keyed naturally by email; a disabled user is
/// rejected for every authenticated operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct User {
    pub(crate) email: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) password_hash: String,
    #[serde(default)]
    pub(crate) disabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Category {
    pub(crate) identifier: Option<i64>,
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Answer {
    pub(crate) identifier: Option<i64>,
    pub(crate) answer_text: String,
    pub(crate) is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Question {
    pub(crate) identifier: Option<i64>,
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) answers: Vec<Answer>,
}

/// Quiz aggregate. Questions and answers are embedded; categories are
/// references checked by the consistency rules before any persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Quiz {
    pub(crate) identifier: Option<i64>,
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    pub(crate) owner: String,
    #[serde(default)]
    pub(crate) questions: Vec<Question>,
    #[serde(default)]
    pub(crate) categories: Vec<i64>,
}

const SEQ_CATEGORY: &str = "category";
const SEQ_QUIZ: &str = "quiz";
const SEQ_QUESTION: &str = "question";
const SEQ_ANSWER: &str = "answer";

impl Document for User {
    const COLLECTION: &'static str = "users";

    fn key(&self) -> Option<String> {
        Some(self.email.clone())
    }
}

impl Document for Category {
    const COLLECTION: &'static str = "categories";

    fn key(&self) -> Option<String> {
        self.identifier.map(|id| id.to_string())
    }

    fn unassigned_sequences(&self) -> Vec<&'static str> {
        if self.identifier.is_none() {
            vec![SEQ_CATEGORY]
        } else {
            Vec::new()
        }
    }

    fn assign_sequences(&mut self, values: &mut dyn Iterator<Item = i64>) {
        if self.identifier.is_none() {
            self.identifier = values.next();
        }
    }
}

impl Document for Quiz {
    const COLLECTION: &'static str = "quizzes";

    fn key(&self) -> Option<String> {
        self.identifier.map(|id| id.to_string())
    }

    fn unassigned_sequences(&self) -> Vec<&'static str> {
        let mut scopes = Vec::new();
        if self.identifier.is_none() {
            scopes.push(SEQ_QUIZ);
        }
        for question in &self.questions {
            if question.identifier.is_none() {
                scopes.push(SEQ_QUESTION);
            }
            for answer in &question.answers {
                if answer.identifier.is_none() {
                    scopes.push(SEQ_ANSWER);
                }
            }
        }
        scopes
    }

    // Walk order must match unassigned_sequences.
    fn assign_sequences(&mut self, values: &mut dyn Iterator<Item = i64>) {
        if self.identifier.is_none() {
            self.identifier = values.next();
        }
        for question in &mut self.questions {
            if question.identifier.is_none() {
                question.identifier = values.next();
            }
            for answer in &mut question.answers {
                if answer.identifier.is_none() {
                    answer.identifier = values.next();
                }
            }
        }
    }
}
