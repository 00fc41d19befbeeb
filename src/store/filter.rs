use serde_json::Value;

/// Structured query over stored documents. Replaces stringly operator
/// suffixes with named clauses; field names come from code, never from
/// clients.
#[derive(Debug, Clone, Default)]
pub(crate) struct Filter {
    clauses: Vec<Clause>,
}

#[derive(Debug, Clone)]
pub(crate) enum Clause {
    /// Exact match on the primary key.
    Key(String),
    /// Exact match on a document field.
    Equals(&'static str, Value),
    /// Case-insensitive substring match on a string field.
    Contains(&'static str, String),
    /// Membership: a list field shares at least one element with the values.
    In(&'static str, Vec<Value>),
}

impl Filter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn by_key(key: impl Into<String>) -> Self {
        Self { clauses: vec![Clause::Key(key.into())] }
    }

    pub(crate) fn equals(mut self, field: &'static str, value: impl Into<Value>) -> Self {
        self.clauses.push(Clause::Equals(field, value.into()));
        self
    }

    pub(crate) fn contains(mut self, field: &'static str, needle: impl Into<String>) -> Self {
        self.clauses.push(Clause::Contains(field, needle.into()));
        self
    }

    pub(crate) fn is_in(mut self, field: &'static str, values: Vec<Value>) -> Self {
        self.clauses.push(Clause::In(field, values));
        self
    }

    pub(crate) fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Evaluates the filter against a serialized document. Shared by the
    /// in-memory store; the Postgres store translates clauses to SQL with
    /// the same semantics.
    pub(crate) fn matches(&self, key: &str, doc: &Value) -> bool {
        self.clauses.iter().all(|clause| clause.matches(key, doc))
    }
}

impl Clause {
    fn matches(&self, key: &str, doc: &Value) -> bool {
        match self {
            Clause::Key(expected) => key == expected,
            Clause::Equals(field, value) => doc.get(field) == Some(value),
            Clause::Contains(field, needle) => doc
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|text| text.to_lowercase().contains(&needle.to_lowercase())),
            Clause::In(field, values) => doc
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|elements| elements.iter().any(|element| values.contains(element))),
        }
    }
}

/// Window over a filtered listing. `limit` is capped at [`Page::MAX_LIMIT`]
/// by the API layer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Page {
    pub(crate) skip: i64,
    pub(crate) limit: i64,
}

impl Page {
    pub(crate) const MAX_LIMIT: i64 = 1000;
    pub(crate) const DEFAULT_LIMIT: i64 = 100;

    /// A single-row window, for existence probes and get-by-key.
    pub(crate) fn first() -> Self {
        Self { skip: 0, limit: 1 }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { skip: 0, limit: Self::DEFAULT_LIMIT }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quiz_doc() -> Value {
        json!({
            "identifier": 7,
            "title": "Rust Basics",
            "description": "Ownership and borrowing",
            "owner": "alice@example.com",
            "categories": [1, 3],
        })
    }

    #[test]
    fn key_clause_matches_only_its_key() {
        let filter = Filter::by_key("7");
        assert!(filter.matches("7", &quiz_doc()));
        assert!(!filter.matches("8", &quiz_doc()));
    }

    #[test]
    fn equals_is_exact() {
        let doc = quiz_doc();
        assert!(Filter::new().equals("owner", "alice@example.com").matches("7", &doc));
        assert!(!Filter::new().equals("owner", "Alice@example.com").matches("7", &doc));
        assert!(!Filter::new().equals("missing", "x").matches("7", &doc));
    }

    #[test]
    fn contains_ignores_case() {
        let doc = quiz_doc();
        assert!(Filter::new().contains("title", "rust").matches("7", &doc));
        assert!(Filter::new().contains("description", "BORROW").matches("7", &doc));
        assert!(!Filter::new().contains("title", "python").matches("7", &doc));
    }

    #[test]
    fn contains_on_non_string_field_is_false() {
        assert!(!Filter::new().contains("identifier", "7").matches("7", &quiz_doc()));
    }

    #[test]
    fn in_matches_any_shared_element() {
        let doc = quiz_doc();
        assert!(Filter::new().is_in("categories", vec![json!(3), json!(9)]).matches("7", &doc));
        assert!(!Filter::new().is_in("categories", vec![json!(2)]).matches("7", &doc));
        assert!(!Filter::new().is_in("categories", vec![]).matches("7", &doc));
    }

    #[test]
    fn clauses_combine_with_and() {
        let doc = quiz_doc();
        let filter = Filter::new().equals("owner", "alice@example.com").contains("title", "rust");
        assert!(filter.matches("7", &doc));
        let filter = Filter::new().equals("owner", "alice@example.com").contains("title", "python");
        assert!(!filter.matches("7", &doc));
    }
}
