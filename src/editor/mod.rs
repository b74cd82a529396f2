//! Tree editors and the facade that composes them into user gestures.
//!
//! Every operation borrows its input tree and returns a freshly owned one; a
//! failed edit leaves the caller's tree exactly as it was.
crate::reexport!(projection);
crate::reexport!(joins);
crate::reexport!(predicates);
crate::reexport!(query_editor);

use crate::*;
use std::str::FromStr;

/// Knobs shared by the editors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOptions {
    /// Dialect used when the editors need to parse a generated fragment.
    pub dialect: SqlDialect,
    /// Collapse fully covered tables into `table.*` / `*`.
    pub compress_stars: bool,
    /// Appended to LIKE filter values.
    pub like_suffix: String,
}

impl Default for EditOptions {
    fn default() -> Self {
        Self {
            dialect: SqlDialect::Generic,
            compress_stars: true,
            like_suffix: "%".to_string(),
        }
    }
}

impl EditOptions {
    pub fn from_config() -> Result<Self> {
        let config = config();
        Ok(Self {
            dialect: config.dialect.parse()?,
            compress_stars: config.compress_stars,
            like_suffix: config.like_suffix.clone(),
        })
    }
}

/// Operator of a filter gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum FilterOperator {
    #[display("like")]
    Like,
    #[display("{_0}")]
    Compare(ComparisonOp),
}

impl FromStr for FilterOperator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().eq_ignore_ascii_case("like") {
            return Ok(FilterOperator::Like);
        }
        s.parse().map(FilterOperator::Compare)
    }
}

impl FilterOperator {
    /// Whether `predicate` is a leaf of the kind this operator produces. Any
    /// comparison operator targets any comparison leaf.
    pub fn targets(self, predicate: &Predicate) -> bool {
        matches!(
            (self, predicate),
            (FilterOperator::Like, Predicate::Like { .. })
                | (FilterOperator::Compare(_), Predicate::Comparison { .. })
        )
    }
}

/// The active filter on a column, as a user would type it back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub operator: FilterOperator,
    pub value: String,
}

/// Name a column contributes to a resolved projection: `table.col` -> `col`,
/// function renderings untouched.
pub(crate) fn projected_name(column: &str) -> &str {
    if column.contains('(') {
        return column;
    }
    match target_of(column) {
        Target::Column { name, .. } => name,
        Target::Wildcard | Target::TableWildcard(_) => column,
    }
}

/// Resolved name of a group-by/order-by key, `None` for wildcards.
pub(crate) fn resolved_name(column: &ColumnRef) -> Option<String> {
    match column {
        ColumnRef::Identifier(_) => column.column_name().map(str::to_string),
        ColumnRef::FunctionCall { .. } => Some(column.raw()),
    }
}
