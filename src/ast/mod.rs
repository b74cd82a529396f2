//! Closed node model for the `SELECT` subset the editors understand.
//!
//! One enum per grammar category (`ColumnRef`, `FromNode`, `Predicate`), so every
//! walk is an exhaustive match. `Display` on these types is the printer: the
//! output parses back into a tree with the same projection and tables.
crate::reexport!(column);
crate::reexport!(from);
crate::reexport!(predicate);

use crate::*;
use itertools::Itertools as _;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Select {
    pub items: Vec<ColumnRef>,
    pub from: FromNode,
    /// The `WHERE` clause.
    pub selection: Option<Predicate>,
    /// Empty when there is no `GROUP BY`.
    pub group_by: Vec<ColumnRef>,
    /// Empty when there is no `ORDER BY`.
    pub order_by: Vec<OrderItem>,
}

impl Select {
    pub fn new(items: impl IntoIterator<Item = ColumnRef>, from: FromNode) -> Self {
        Self {
            items: items.into_iter().collect(),
            from,
            selection: None,
            group_by: Vec::new(),
            order_by: Vec::new(),
        }
    }

    /// Check the structural invariants every editor relies on.
    pub fn validate(&self) -> Result {
        if self.items.is_empty() {
            return Err(Error::malformed("empty projection"));
        }
        self.items.iter().try_for_each(validate_column)?;
        validate_from(&self.from)?;
        if let Some(selection) = &self.selection {
            validate_predicate(selection)?;
        }
        self.group_by.iter().try_for_each(validate_column)?;
        self.order_by
            .iter()
            .try_for_each(|item| validate_column(&item.column))
    }
}

fn validate_column(column: &ColumnRef) -> Result {
    match column {
        ColumnRef::Identifier(text) => {
            if text.is_empty() || text.split('.').any(str::is_empty) {
                return Err(Error::malformed(format!("bad identifier {text:?}")));
            }
            Ok(())
        }
        ColumnRef::FunctionCall { name, args } => {
            if name.is_empty() {
                return Err(Error::malformed("function call without a name"));
            }
            args.iter().try_for_each(validate_column)
        }
    }
}

fn validate_from(node: &FromNode) -> Result {
    match node {
        FromNode::Table { name, .. } if name.is_empty() => {
            Err(Error::malformed("table reference without a name"))
        }
        FromNode::Table { .. } => Ok(()),
        FromNode::Join { left, right, .. } | FromNode::NaturalJoin { left, right } => {
            validate_from(left)?;
            validate_from(right)
        }
        FromNode::References(items) if items.is_empty() => {
            Err(Error::malformed("empty table reference list"))
        }
        FromNode::References(items) => items.iter().try_for_each(validate_from),
        FromNode::Nested(inner) => validate_from(inner),
        FromNode::SubQuery { query, .. } => query.validate(),
    }
}

fn validate_predicate(predicate: &Predicate) -> Result {
    match predicate {
        Predicate::Comparison { column, .. } | Predicate::Like { column, .. } => {
            if column.is_empty() {
                return Err(Error::malformed("predicate without a column"));
            }
            Ok(())
        }
        Predicate::And { left, right } | Predicate::Or { left, right } => {
            validate_predicate(left)?;
            validate_predicate(right)
        }
    }
}

impl fmt::Display for Select {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT {} FROM {}", self.items.iter().join(", "), self.from)?;
        if let Some(selection) = &self.selection {
            write!(f, " WHERE {selection}")?;
        }
        if !self.group_by.is_empty() {
            write!(f, " GROUP BY {}", self.group_by.iter().join(", "))?;
        }
        if !self.order_by.is_empty() {
            write!(f, " ORDER BY {}", self.order_by.iter().join(", "))?;
        }
        Ok(())
    }
}
