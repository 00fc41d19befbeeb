use serde::{Deserialize, Serialize};

use crate::domain::Category;

#[derive(Debug, Deserialize)]
pub(crate) struct CategoryUpsert {
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CategoryResponse {
    pub(crate) identifier: i64,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
}

impl CategoryUpsert {
    pub(crate) fn into_entity(self) -> Category {
        Category { identifier: None, title: self.title, description: self.description }
    }
}

impl CategoryResponse {
    pub(crate) fn from_entity(category: Category) -> Self {
        Self {
            identifier: category.identifier.unwrap_or_default(),
            title: category.title,
            description: category.description,
        }
    }
}
