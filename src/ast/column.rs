use itertools::Itertools as _;
use std::fmt;

/// A projection item, group-by key or order-by key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnRef {
    /// `col`, `table.col`, `table.*` or `*`. Function arguments keep their raw text here.
    Identifier(String),
    FunctionCall { name: String, args: Vec<ColumnRef> },
}

/// What an identifier refers to once its qualifier is split off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    Wildcard,
    TableWildcard(&'a str),
    Column {
        table: Option<&'a str>,
        name: &'a str,
    },
}

impl ColumnRef {
    pub fn identifier(text: impl Into<String>) -> Self {
        ColumnRef::Identifier(text.into())
    }

    pub fn function(name: impl Into<String>, args: impl IntoIterator<Item = ColumnRef>) -> Self {
        ColumnRef::FunctionCall {
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }

    /// Classify an identifier. Function calls have no target.
    pub fn target(&self) -> Option<Target<'_>> {
        match self {
            ColumnRef::Identifier(text) => Some(target_of(text)),
            ColumnRef::FunctionCall { .. } => None,
        }
    }

    /// Unqualified column name for plain column references.
    pub fn column_name(&self) -> Option<&str> {
        match self.target()? {
            Target::Column { name, .. } => Some(name),
            Target::Wildcard | Target::TableWildcard(_) => None,
        }
    }

    /// Compact rendering used for resolved projections: raw identifier text,
    /// or `name(arg1,arg2)` for calls.
    pub fn raw(&self) -> String {
        match self {
            ColumnRef::Identifier(text) => text.clone(),
            ColumnRef::FunctionCall { name, args } => {
                format!("{name}({})", args.iter().map(ColumnRef::raw).join(","))
            }
        }
    }
}

pub(crate) fn target_of(text: &str) -> Target<'_> {
    if text == "*" {
        return Target::Wildcard;
    }
    match text.rsplit_once('.') {
        Some((table, "*")) => Target::TableWildcard(table),
        Some((table, name)) => Target::Column {
            table: Some(table),
            name,
        },
        None => Target::Column {
            table: None,
            name: text,
        },
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Identifier(text) => f.write_str(text),
            ColumnRef::FunctionCall { name, args } => {
                write!(f, "{name}({})", args.iter().join(", "))
            }
        }
    }
}

/// One `ORDER BY` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderItem {
    pub column: ColumnRef,
    /// `None` when no direction was written.
    pub ascending: Option<bool>,
}

impl OrderItem {
    pub fn new(column: ColumnRef, ascending: Option<bool>) -> Self {
        Self { column, ascending }
    }
}

impl fmt::Display for OrderItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column)?;
        match self.ascending {
            Some(true) => f.write_str(" ASC"),
            Some(false) => f.write_str(" DESC"),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("*", Target::Wildcard)]
    #[case("flights.*", Target::TableWildcard("flights"))]
    #[case("flights.id", Target::Column { table: Some("flights"), name: "id" })]
    #[case("public.flights.id", Target::Column { table: Some("public.flights"), name: "id" })]
    #[case("id", Target::Column { table: None, name: "id" })]
    fn classifies_identifiers(#[case] text: &str, #[case] expected: Target<'static>) {
        assert_eq!(ColumnRef::identifier(text).target(), Some(expected));
    }

    #[test]
    fn function_calls_render_compactly_and_for_display() {
        let call = ColumnRef::function(
            "count",
            [ColumnRef::identifier("id"), ColumnRef::identifier("name")],
        );
        assert_eq!(call.raw(), "count(id,name)");
        assert_eq!(call.to_string(), "count(id, name)");
        assert_eq!(call.target(), None);
        assert_eq!(call.column_name(), None);
    }

    #[test]
    fn order_items_display_direction() {
        let col = ColumnRef::identifier("delay");
        assert_eq!(OrderItem::new(col.clone(), None).to_string(), "delay");
        assert_eq!(OrderItem::new(col.clone(), Some(true)).to_string(), "delay ASC");
        assert_eq!(OrderItem::new(col, Some(false)).to_string(), "delay DESC");
    }
}
