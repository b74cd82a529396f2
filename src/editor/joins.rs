use crate::*;
use itertools::Itertools as _;

/// Edits on the `FROM` tree.
///
/// Tables are only ever added or removed as natural joins. Anything else the
/// user typed (explicit `JOIN .. ON`, comma lists, derived tables) is carried
/// through untouched.
pub struct JoinGraph;

impl JoinGraph {
    /// Distinct table names reachable from the `FROM` tree, in first-seen order.
    /// Derived tables contribute the tables they read from.
    pub fn tables(select: &Select) -> Vec<String> {
        Self::collect(&select.from).into_iter().unique().collect()
    }

    fn collect(node: &FromNode) -> Vec<String> {
        match node {
            FromNode::Table { name, .. } => vec![name.clone()],
            FromNode::Nested(inner) => Self::collect(inner),
            FromNode::SubQuery { query, .. } => Self::collect(&query.from),
            FromNode::References(items) => items.iter().flat_map(Self::collect).collect(),
            FromNode::Join { left, right, .. } | FromNode::NaturalJoin { left, right } => {
                let mut tables = Self::collect(left);
                tables.extend(Self::collect(right));
                tables
            }
        }
    }

    /// Natural-join `table` onto the leftmost table of the `FROM` tree.
    pub fn add_natural_join(select: &Select, table: &str) -> Result<Select> {
        select.validate()?;
        debug!("Natural joining {table}");
        Ok(Select {
            from: Self::grow(&select.from, table),
            ..select.clone()
        })
    }

    fn grow(node: &FromNode, table: &str) -> FromNode {
        match node {
            FromNode::Table { .. } | FromNode::SubQuery { .. } => {
                FromNode::natural_join(node.clone(), FromNode::table(table))
            }
            FromNode::Nested(inner) => FromNode::Nested(Box::new(Self::grow(inner, table))),
            FromNode::References(items) => FromNode::References(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| if i == 0 { Self::grow(item, table) } else { item.clone() })
                    .collect(),
            ),
            FromNode::Join {
                left,
                right,
                kind,
                constraint,
            } => FromNode::Join {
                left: Box::new(Self::grow(left, table)),
                right: right.clone(),
                kind: *kind,
                constraint: constraint.clone(),
            },
            FromNode::NaturalJoin { left, right } => FromNode::NaturalJoin {
                left: Box::new(Self::grow(left, table)),
                right: right.clone(),
            },
        }
    }

    /// Drop `table` where it is one side of a natural join, promoting the other
    /// side. Tables joined any other way are left in place, so callers check
    /// [`JoinGraph::tables`] afterwards to see whether the removal took.
    pub fn remove_natural_join(select: &Select, table: &str) -> Result<Select> {
        select.validate()?;
        debug!("Removing natural join on {table}");
        Ok(Select {
            from: Self::prune(&select.from, table),
            ..select.clone()
        })
    }

    fn prune(node: &FromNode, table: &str) -> FromNode {
        match node {
            FromNode::NaturalJoin { left, right } => {
                if left.table_name() == Some(table) {
                    (**right).clone()
                } else if right.table_name() == Some(table) {
                    (**left).clone()
                } else {
                    FromNode::NaturalJoin {
                        left: Box::new(Self::prune(left, table)),
                        right: Box::new(Self::prune(right, table)),
                    }
                }
            }
            FromNode::References(items) => {
                FromNode::References(items.iter().map(|item| Self::prune(item, table)).collect())
            }
            FromNode::Nested(inner) => match Self::prune(inner, table) {
                bare @ FromNode::Table { .. } => bare,
                other => FromNode::Nested(Box::new(other)),
            },
            other => other.clone(),
        }
    }

    /// A fresh left-deep natural-join chain over `tables`, built by parsing the
    /// generated fragment so it is shaped exactly like user-typed SQL.
    pub fn rebuild_from(dialect: SqlDialect, tables: &[String]) -> Result<FromNode> {
        if tables.is_empty() {
            return Err(Error::unsupported_edit("cannot build a FROM clause without tables"));
        }
        let sql = format!("SELECT * FROM {}", tables.iter().join(" NATURAL JOIN "));
        trace!(%sql, "Rebuilding FROM clause");
        Ok(dialect.parse_select(&sql)?.from)
    }

    pub fn replace_from(select: &Select, from: FromNode) -> Select {
        Select {
            from,
            ..select.clone()
        }
    }
}
