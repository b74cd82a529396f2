use crate::*;
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ComparisonOp {
    #[display("<")]
    Lt,
    #[display("<=")]
    LtEq,
    #[display("=")]
    Eq,
    #[display(">=")]
    GtEq,
    #[display(">")]
    Gt,
    #[display("<>")]
    NotEq,
}

impl FromStr for ComparisonOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim() {
            "<" => ComparisonOp::Lt,
            "<=" => ComparisonOp::LtEq,
            "=" => ComparisonOp::Eq,
            ">=" => ComparisonOp::GtEq,
            ">" => ComparisonOp::Gt,
            "<>" | "!=" => ComparisonOp::NotEq,
            other => {
                return Err(Error::unsupported_edit(format!(
                    "unknown comparison operator {other:?}"
                )));
            }
        })
    }
}

/// A constant on the right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    /// Numeric literal, kept as written.
    Number(String),
    /// Unquoted string contents.
    String(String),
    Boolean(bool),
    Null,
}

impl Literal {
    pub fn number(text: impl Into<String>) -> Self {
        Literal::Number(text.into())
    }

    pub fn string(text: impl Into<String>) -> Self {
        Literal::String(text.into())
    }

    /// The literal's value without SQL quoting.
    pub fn value(&self) -> String {
        match self {
            Literal::Number(n) => n.clone(),
            Literal::String(s) => s.clone(),
            Literal::Boolean(b) => b.to_string(),
            Literal::Null => "null".to_string(),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => f.write_str(n),
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Literal::Boolean(true) => f.write_str("TRUE"),
            Literal::Boolean(false) => f.write_str("FALSE"),
            Literal::Null => f.write_str("NULL"),
        }
    }
}

/// A `WHERE` tree: comparison/LIKE leaves joined by AND/OR.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    Comparison {
        column: String,
        operator: ComparisonOp,
        value: Literal,
    },
    Like {
        column: String,
        pattern: Literal,
    },
    And {
        left: Box<Predicate>,
        right: Box<Predicate>,
    },
    Or {
        left: Box<Predicate>,
        right: Box<Predicate>,
    },
}

impl Predicate {
    pub fn comparison(column: impl Into<String>, operator: ComparisonOp, value: Literal) -> Self {
        Predicate::Comparison {
            column: column.into(),
            operator,
            value,
        }
    }

    pub fn like(column: impl Into<String>, pattern: Literal) -> Self {
        Predicate::Like {
            column: column.into(),
            pattern,
        }
    }

    pub fn and(left: Predicate, right: Predicate) -> Self {
        Predicate::And {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn or(left: Predicate, right: Predicate) -> Self {
        Predicate::Or {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Predicate::Comparison { .. } | Predicate::Like { .. })
    }

    /// Column tested by a leaf predicate.
    pub fn column(&self) -> Option<&str> {
        match self {
            Predicate::Comparison { column, .. } | Predicate::Like { column, .. } => {
                Some(column.as_str())
            }
            Predicate::And { .. } | Predicate::Or { .. } => None,
        }
    }

    /// Every column tested anywhere in the tree, left to right.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Predicate::Comparison { column, .. } | Predicate::Like { column, .. } => {
                vec![column.as_str()]
            }
            Predicate::And { left, right } | Predicate::Or { left, right } => {
                let mut columns = left.columns();
                columns.extend(right.columns());
                columns
            }
        }
    }

    fn fmt_operand(operand: &Predicate, parent_is_and: bool, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match operand {
            Predicate::Or { .. } if parent_is_and => write!(f, "({operand})"),
            _ => write!(f, "{operand}"),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Comparison {
                column,
                operator,
                value,
            } => write!(f, "{column} {operator} {value}"),
            Predicate::Like { column, pattern } => write!(f, "{column} LIKE {pattern}"),
            Predicate::And { left, right } => {
                Self::fmt_operand(left, true, f)?;
                f.write_str(" AND ")?;
                Self::fmt_operand(right, true, f)
            }
            Predicate::Or { left, right } => {
                Self::fmt_operand(left, false, f)?;
                f.write_str(" OR ")?;
                Self::fmt_operand(right, false, f)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("<", ComparisonOp::Lt)]
    #[case("<=", ComparisonOp::LtEq)]
    #[case("=", ComparisonOp::Eq)]
    #[case(">=", ComparisonOp::GtEq)]
    #[case(">", ComparisonOp::Gt)]
    #[case("<>", ComparisonOp::NotEq)]
    #[case("!=", ComparisonOp::NotEq)]
    fn parses_operators(#[case] text: &str, #[case] expected: ComparisonOp) {
        assert_eq!(text.parse::<ComparisonOp>().ok(), Some(expected));
    }

    #[test]
    fn rejects_unknown_operator() {
        assert!(matches!(
            "~".parse::<ComparisonOp>(),
            Err(Error::UnsupportedEdit(_))
        ));
    }

    #[test]
    fn quotes_string_literals() {
        assert_eq!(Literal::string("o'hare").to_string(), "'o''hare'");
        assert_eq!(Literal::string("o'hare").value(), "o'hare");
        assert_eq!(Literal::number("-3.5").to_string(), "-3.5");
    }

    #[test]
    fn parenthesizes_or_under_and() {
        let delay = Predicate::comparison("delay", ComparisonOp::GtEq, Literal::number("30"));
        let city = Predicate::comparison("city", ComparisonOp::Eq, Literal::string("nyc"));
        let name = Predicate::like("name", Literal::string("Del%"));

        let tree = Predicate::and(delay.clone(), Predicate::or(city.clone(), name.clone()));
        assert_eq!(
            tree.to_string(),
            "delay >= 30 AND (city = 'nyc' OR name LIKE 'Del%')"
        );

        let tree = Predicate::or(Predicate::and(delay, city), name);
        assert_eq!(
            tree.to_string(),
            "delay >= 30 AND city = 'nyc' OR name LIKE 'Del%'"
        );
        assert_eq!(tree.columns(), ["delay", "city", "name"]);
    }
}
