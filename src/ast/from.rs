use crate::*;
use itertools::Itertools as _;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum JoinKind {
    #[display("JOIN")]
    Plain,
    #[display("INNER JOIN")]
    Inner,
    #[display("LEFT JOIN")]
    Left,
    #[display("LEFT OUTER JOIN")]
    LeftOuter,
    #[display("RIGHT JOIN")]
    Right,
    #[display("RIGHT OUTER JOIN")]
    RightOuter,
    #[display("FULL OUTER JOIN")]
    FullOuter,
}

/// Condition of a plain join. Kept as text, the engine never edits it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JoinConstraint {
    None,
    On(String),
    Using(Vec<String>),
}

/// The `FROM` tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FromNode {
    Table {
        name: String,
        alias: Option<String>,
    },
    Join {
        left: Box<FromNode>,
        right: Box<FromNode>,
        kind: JoinKind,
        constraint: JoinConstraint,
    },
    NaturalJoin {
        left: Box<FromNode>,
        right: Box<FromNode>,
    },
    /// Comma separated list, `FROM a, b`.
    References(Vec<FromNode>),
    /// Parenthesized join group, `(a JOIN b ON ...)`.
    Nested(Box<FromNode>),
    SubQuery {
        query: Box<Select>,
        alias: Option<String>,
    },
}

impl FromNode {
    pub fn table(name: impl Into<String>) -> Self {
        FromNode::Table {
            name: name.into(),
            alias: None,
        }
    }

    pub fn natural_join(left: FromNode, right: FromNode) -> Self {
        FromNode::NaturalJoin {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Name of a bare table leaf.
    pub fn table_name(&self) -> Option<&str> {
        match self {
            FromNode::Table { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    /// True when the tree holds nothing but unaliased tables, natural joins and
    /// parentheses, so it can be rebuilt from table names alone.
    pub fn is_natural_chain(&self) -> bool {
        match self {
            FromNode::Table { alias, .. } => alias.is_none(),
            FromNode::NaturalJoin { left, right } => {
                left.is_natural_chain() && right.is_natural_chain()
            }
            FromNode::Nested(inner) => inner.is_natural_chain(),
            FromNode::Join { .. } | FromNode::References(_) | FromNode::SubQuery { .. } => false,
        }
    }

    fn fmt_right(node: &FromNode, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match node {
            FromNode::Join { .. } | FromNode::NaturalJoin { .. } | FromNode::References(_) => {
                write!(f, "({node})")
            }
            _ => write!(f, "{node}"),
        }
    }

    fn fmt_left(node: &FromNode, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match node {
            FromNode::References(_) => write!(f, "({node})"),
            _ => write!(f, "{node}"),
        }
    }
}

impl fmt::Display for FromNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FromNode::Table { name, alias } => {
                f.write_str(name)?;
                if let Some(alias) = alias {
                    write!(f, " AS {alias}")?;
                }
                Ok(())
            }
            FromNode::Join {
                left,
                right,
                kind,
                constraint,
            } => {
                Self::fmt_left(left, f)?;
                write!(f, " {kind} ")?;
                Self::fmt_right(right, f)?;
                match constraint {
                    JoinConstraint::None => Ok(()),
                    JoinConstraint::On(condition) => write!(f, " ON {condition}"),
                    JoinConstraint::Using(columns) => {
                        write!(f, " USING ({})", columns.iter().join(", "))
                    }
                }
            }
            FromNode::NaturalJoin { left, right } => {
                Self::fmt_left(left, f)?;
                f.write_str(" NATURAL JOIN ")?;
                Self::fmt_right(right, f)
            }
            FromNode::References(items) => write!(f, "{}", items.iter().join(", ")),
            FromNode::Nested(inner) => write!(f, "({inner})"),
            FromNode::SubQuery { query, alias } => {
                write!(f, "({query})")?;
                if let Some(alias) = alias {
                    write!(f, " AS {alias}")?;
                }
                Ok(())
            }
        }
    }
}
