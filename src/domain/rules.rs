use std::sync::OnceLock;

use regex::Regex;
use serde_json::json;

use super::{Answer, Category, DomainError, Question, Quiz, User};
use crate::store::{Filter, Page, Repository};

pub(crate) const MAX_QUIZ_CATEGORIES: usize = 3;
pub(crate) const MIN_PASSWORD_LEN: usize = 8;

/// Every referenced category must exist; fails fast on the first missing id.
pub(crate) async fn categories_exist(
    categories: &dyn Repository<Category>,
    ids: &[i64],
) -> Result<(), DomainError> {
    for id in ids {
        if categories.get(&id.to_string()).await?.is_none() {
            return Err(DomainError::NotFound(format!("Category {id} does not exist")));
        }
    }
    Ok(())
}

pub(crate) fn category_count_valid(categories: &[i64]) -> Result<(), DomainError> {
    if categories.len() > MAX_QUIZ_CATEGORIES {
        return Err(DomainError::Invalid(format!(
            "A quiz may reference at most {MAX_QUIZ_CATEGORIES} categories"
        )));
    }
    Ok(())
}

pub(crate) fn answers_have_a_correct_one(answers: &[Answer]) -> Result<(), DomainError> {
    if answers.iter().any(|answer| answer.is_correct) {
        Ok(())
    } else {
        Err(DomainError::Invalid("At least one correct answer is required".to_string()))
    }
}

pub(crate) fn questions_nonempty(questions: &[Question]) -> Result<(), DomainError> {
    if questions.is_empty() {
        Err(DomainError::Invalid("At least one question is required".to_string()))
    } else {
        Ok(())
    }
}

/// Strict identity match; callers reject with `Forbidden` when false.
pub(crate) fn is_owner(quiz: &Quiz, user: &User) -> bool {
    quiz.owner == user.email
}

/// True while at least one persisted quiz references the category. Checked
/// immediately before a category delete; no snapshot is held across calls.
pub(crate) async fn category_in_use(
    quizzes: &dyn Repository<Quiz>,
    category_id: i64,
) -> Result<bool, DomainError> {
    let referencing = quizzes
        .filter(&Filter::new().is_in("categories", vec![json!(category_id)]), Page::first())
        .await?;
    Ok(!referencing.is_empty())
}

/// Composite gate for quiz create/update. Runs before any persist, in a
/// fixed order, short-circuiting on the first violation: category
/// existence, category count, questions present, one correct answer per
/// question, then field shapes.
pub(crate) async fn validate_quiz_upsert(
    categories: &dyn Repository<Category>,
    quiz: &Quiz,
) -> Result<(), DomainError> {
    categories_exist(categories, &quiz.categories).await?;
    category_count_valid(&quiz.categories)?;
    questions_nonempty(&quiz.questions)?;
    for question in &quiz.questions {
        answers_have_a_correct_one(&question.answers)?;
    }
    validate_quiz_fields(quiz)
}

pub(crate) fn validate_quiz_fields(quiz: &Quiz) -> Result<(), DomainError> {
    length_between(&quiz.title, 3, 75, "title")?;
    if let Some(description) = &quiz.description {
        length_at_most(description, 255, "description")?;
    }
    for question in &quiz.questions {
        length_between(&question.title, 3, 500, "question title")?;
        for answer in &question.answers {
            if answer.answer_text.is_empty() {
                return Err(DomainError::Invalid("Answer text must not be empty".to_string()));
            }
            length_at_most(&answer.answer_text, 255, "answer text")?;
        }
    }
    Ok(())
}

pub(crate) fn validate_category_fields(category: &Category) -> Result<(), DomainError> {
    length_between(&category.title, 3, 75, "title")?;
    if let Some(description) = &category.description {
        length_at_most(description, 255, "description")?;
    }
    Ok(())
}

pub(crate) fn validate_name(value: &str, field: &str) -> Result<(), DomainError> {
    length_between(value, 3, 30, field)
}

pub(crate) fn validate_email(email: &str) -> Result<(), DomainError> {
    if email_regex().is_match(email) {
        Ok(())
    } else {
        Err(DomainError::Invalid("Email is not valid".to_string()))
    }
}

/// Password compliance: length, a digit, an uppercase letter, a symbol.
pub(crate) fn validate_password(password: &str) -> Result<(), DomainError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::Invalid(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(DomainError::Invalid("Password must contain a digit".to_string()));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(DomainError::Invalid(
            "Password must contain an uppercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_punctuation() || c == ' ') {
        return Err(DomainError::Invalid("Password must contain a symbol".to_string()));
    }
    Ok(())
}

fn length_between(value: &str, min: usize, max: usize, field: &str) -> Result<(), DomainError> {
    let count = value.chars().count();
    if count < min || count > max {
        return Err(DomainError::Invalid(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

fn length_at_most(value: &str, max: usize, field: &str) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::Invalid(format!("{field} must be at most {max} characters")));
    }
    Ok(())
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
        )
        .expect("email pattern is valid")
    })
}
