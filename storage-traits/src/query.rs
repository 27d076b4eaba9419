//! Backend query construction.
//!
//! Queries are ultimately interpreted by the backend adapter, but the
//! clause convention is fixed here: `field = 'value'` equality clauses
//! joined with `AND`, with a trashed-exclusion clause appended unless the
//! caller overrides it. Excluding trashed entries in the query (instead of
//! filtering client-side) keeps deleted entries off the wire.

/// One clause of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// Field equality: rendered as `field = 'value'`.
    Eq { field: String, value: String },
    /// An opaque backend-interpreted expression, passed through verbatim.
    Raw(String),
}

/// Builder for the query strings handed to backend adapters.
///
/// # Example
///
/// ```
/// use storage_traits::Query;
///
/// let q = Query::new().field("name", "Report.pdf").field("parent", "folder9");
/// assert_eq!(
///     q.build(),
///     "name = 'Report.pdf' AND parent = 'folder9' AND trashed = false"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct Query {
    clauses: Vec<Clause>,
    include_trashed: bool,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an opaque backend-specific expression.
    pub fn raw(expr: impl Into<String>) -> Self {
        Self {
            clauses: vec![Clause::Raw(expr.into())],
            include_trashed: false,
        }
    }

    /// Add a field-equality clause. Single quotes in the value are escaped.
    pub fn field(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.clauses.push(Clause::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Suppress the implicit trashed-exclusion clause.
    pub fn include_trashed(mut self) -> Self {
        self.include_trashed = true;
        self
    }

    /// Structured access for backends that interpret clauses natively
    /// instead of parsing the rendered string.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Whether soft-deleted entries were explicitly requested.
    pub fn trashed_included(&self) -> bool {
        self.include_trashed
    }

    /// Value of the first equality clause on `field`, if any.
    pub fn eq_value(&self, field: &str) -> Option<&str> {
        self.clauses.iter().find_map(|c| match c {
            Clause::Eq { field: f, value } if f == field => Some(value.as_str()),
            _ => None,
        })
    }

    /// Render the final query string for the adapter.
    pub fn build(&self) -> String {
        let mut parts: Vec<String> = self
            .clauses
            .iter()
            .map(|clause| match clause {
                Clause::Eq { field, value } => {
                    format!("{} = '{}'", field, value.replace('\'', "\\'"))
                }
                Clause::Raw(expr) => expr.clone(),
            })
            .collect();
        if !self.include_trashed {
            parts.push("trashed = false".to_string());
        }
        parts.join(" AND ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_clauses_joined_with_and() {
        let q = Query::new().field("name", "File11").field("parent", "folder10");
        assert_eq!(
            q.build(),
            "name = 'File11' AND parent = 'folder10' AND trashed = false"
        );
    }

    #[test]
    fn test_trashed_exclusion_appended_by_default() {
        let q = Query::new().field("name", "X");
        assert!(q.build().ends_with("AND trashed = false"));
    }

    #[test]
    fn test_include_trashed_overrides_exclusion() {
        let q = Query::new().field("name", "X").include_trashed();
        assert_eq!(q.build(), "name = 'X'");
    }

    #[test]
    fn test_raw_expression_passes_through() {
        let q = Query::raw("mimeType contains 'image/'").include_trashed();
        assert_eq!(q.build(), "mimeType contains 'image/'");
    }

    #[test]
    fn test_single_quotes_escaped() {
        let q = Query::new().field("name", "it's here").include_trashed();
        assert_eq!(q.build(), "name = 'it\\'s here'");
    }

    #[test]
    fn test_eq_value_lookup() {
        let q = Query::new().field("name", "A").field("parent", "p1");
        assert_eq!(q.eq_value("name"), Some("A"));
        assert_eq!(q.eq_value("parent"), Some("p1"));
        assert_eq!(q.eq_value("owner"), None);
    }

    #[test]
    fn test_empty_query_is_only_trashed_exclusion() {
        assert_eq!(Query::new().build(), "trashed = false");
    }
}
