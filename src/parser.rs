//! Text <-> tree boundary.
//!
//! `sqlparser` does the tokenizing and grammar work; this module lowers its AST
//! into the closed node model and refuses anything the editors cannot round
//! trip. Printing is the `Display` impl of [`Select`].
use crate::*;
use itertools::Itertools as _;
use sqlparser::ast as sq;
use sqlparser::dialect::{Dialect, GenericDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, derive_more::Display)]
pub enum SqlDialect {
    #[default]
    #[display("generic")]
    Generic,
    #[display("postgres")]
    Postgres,
    #[display("mysql")]
    MySql,
    #[display("sqlite")]
    Sqlite,
}

impl FromStr for SqlDialect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generic" | "ansi" => Ok(SqlDialect::Generic),
            "postgres" | "postgresql" => Ok(SqlDialect::Postgres),
            "mysql" => Ok(SqlDialect::MySql),
            "sqlite" => Ok(SqlDialect::Sqlite),
            other => Err(Error::Config(format!("unknown SQL dialect {other:?}"))),
        }
    }
}

impl SqlDialect {
    fn dialect(self) -> Box<dyn Dialect> {
        match self {
            SqlDialect::Generic => Box::new(GenericDialect {}),
            SqlDialect::Postgres => Box::new(PostgreSqlDialect {}),
            SqlDialect::MySql => Box::new(MySqlDialect {}),
            SqlDialect::Sqlite => Box::new(SQLiteDialect {}),
        }
    }

    /// Parse query text. Blank text is the empty query.
    pub fn parse(self, sql: &str) -> Result<Option<Select>> {
        if sql.trim().is_empty() {
            return Ok(None);
        }
        let dialect = self.dialect();
        let mut statements = Parser::parse_sql(dialect.as_ref(), sql)?;
        if statements.len() != 1 {
            return Err(Error::unsupported_sql(format!(
                "expected one statement, found {}",
                statements.len()
            )));
        }
        let select = match statements.remove(0) {
            sq::Statement::Query(query) => lower_query(&query)?,
            other => {
                return Err(Error::unsupported_sql(format!(
                    "only SELECT statements can be edited, got `{other}`"
                )));
            }
        };
        select.validate()?;
        trace!("Parsed {sql:?} into {select}");
        Ok(Some(select))
    }

    /// Parse text that must hold a query.
    pub fn parse_select(self, sql: &str) -> Result<Select> {
        self.parse(sql)?
            .ok_or_else(|| Error::unsupported_sql("empty query text"))
    }
}

/// Parse with the configured dialect.
pub fn stringify(select: &Select) -> String {
    select.to_string()
}

/// Byte offset in `sql` of the `Line: L, Column: C` location a parser message
/// points at. Messages without a location refer to the end of the input.
pub fn error_offset(sql: &str, message: &str) -> usize {
    location_offset(sql, message).unwrap_or(sql.len())
}

fn location_offset(sql: &str, message: &str) -> Option<usize> {
    let (_, location) = message.rsplit_once("Line: ")?;
    let (line, rest) = location.split_once(',')?;
    let column = rest.trim_start().strip_prefix("Column:")?.trim_start();
    let column: String = column.chars().take_while(char::is_ascii_digit).collect();
    let line = line.trim().parse::<usize>().ok()?.checked_sub(1)?;
    let column = column.parse::<usize>().ok()?.checked_sub(1)?;

    let line_start = sql
        .split_inclusive('\n')
        .take(line)
        .map(str::len)
        .sum::<usize>();
    let text = sql.get(line_start..)?.lines().next().unwrap_or("");
    let within = text
        .char_indices()
        .nth(column)
        .map_or(text.len(), |(idx, _)| idx);
    Some(line_start + within)
}

fn lower_query(query: &sq::Query) -> Result<Select> {
    if query.with.is_some() {
        return Err(Error::unsupported_sql("WITH clauses"));
    }
    if query.limit_clause.is_some() || query.fetch.is_some() {
        return Err(Error::unsupported_sql("LIMIT/OFFSET/FETCH"));
    }
    let sq::SetExpr::Select(select) = query.body.as_ref() else {
        return Err(Error::unsupported_sql(format!(
            "set operations and VALUES, got `{}`",
            query.body
        )));
    };

    let mut lowered = lower_select(select)?;
    if let Some(order_by) = &query.order_by {
        lowered.order_by = match &order_by.kind {
            sq::OrderByKind::Expressions(exprs) => exprs
                .iter()
                .map(|e| Ok(OrderItem::new(lower_column(&e.expr)?, e.options.asc)))
                .collect::<Result<_>>()?,
            sq::OrderByKind::All(_) => return Err(Error::unsupported_sql("ORDER BY ALL")),
        };
    }
    Ok(lowered)
}

fn lower_select(select: &sq::Select) -> Result<Select> {
    if select.distinct.is_some() {
        return Err(Error::unsupported_sql("DISTINCT"));
    }
    if select.having.is_some() {
        return Err(Error::unsupported_sql("HAVING"));
    }
    if select.from.is_empty() {
        return Err(Error::unsupported_sql("SELECT without FROM"));
    }

    let items = select
        .projection
        .iter()
        .map(lower_item)
        .collect::<Result<Vec<_>>>()?;

    let mut tables = select
        .from
        .iter()
        .map(lower_table_with_joins)
        .collect::<Result<Vec<_>>>()?;
    let from = if tables.len() == 1 {
        tables.remove(0)
    } else {
        FromNode::References(tables)
    };

    let selection = select.selection.as_ref().map(lower_predicate).transpose()?;

    let group_by = match &select.group_by {
        sq::GroupByExpr::Expressions(exprs, modifiers) if modifiers.is_empty() => exprs
            .iter()
            .map(lower_column)
            .collect::<Result<Vec<_>>>()?,
        other => return Err(Error::unsupported_sql(format!("`{other}`"))),
    };

    Ok(Select {
        items,
        from,
        selection,
        group_by,
        order_by: Vec::new(),
    })
}

fn lower_item(item: &sq::SelectItem) -> Result<ColumnRef> {
    match item {
        sq::SelectItem::UnnamedExpr(expr) => lower_column(expr),
        sq::SelectItem::Wildcard(_) | sq::SelectItem::QualifiedWildcard(..) => {
            Ok(ColumnRef::Identifier(item.to_string()))
        }
        other => Err(Error::unsupported_sql(format!("projection item `{other}`"))),
    }
}

fn lower_column(expr: &sq::Expr) -> Result<ColumnRef> {
    match expr {
        sq::Expr::Identifier(_) | sq::Expr::CompoundIdentifier(_) => {
            Ok(ColumnRef::Identifier(identifier(expr)?))
        }
        sq::Expr::Function(function) => lower_function(function),
        other => Err(Error::unsupported_sql(format!("column expression `{other}`"))),
    }
}

fn lower_function(function: &sq::Function) -> Result<ColumnRef> {
    if function.over.is_some() || function.filter.is_some() {
        return Err(Error::unsupported_sql(format!("window/filtered call `{function}`")));
    }
    let args = match &function.args {
        sq::FunctionArguments::None => Vec::new(),
        sq::FunctionArguments::List(list) if list.duplicate_treatment.is_none() => list
            .args
            .iter()
            .map(|arg| match arg {
                sq::FunctionArg::Unnamed(arg) => Ok(ColumnRef::Identifier(arg.to_string())),
                named => Err(Error::unsupported_sql(format!("named argument `{named}`"))),
            })
            .collect::<Result<Vec<_>>>()?,
        _ => return Err(Error::unsupported_sql(format!("call `{function}`"))),
    };
    Ok(ColumnRef::FunctionCall {
        name: function.name.to_string(),
        args,
    })
}

fn identifier(expr: &sq::Expr) -> Result<String> {
    match expr {
        sq::Expr::Identifier(ident) => Ok(ident.to_string()),
        sq::Expr::CompoundIdentifier(parts) => Ok(parts.iter().join(".")),
        sq::Expr::Nested(inner) => identifier(inner),
        other => Err(Error::unsupported_sql(format!(
            "expected a column, got `{other}`"
        ))),
    }
}

fn lower_table_with_joins(table: &sq::TableWithJoins) -> Result<FromNode> {
    let base = lower_factor(&table.relation)?;
    table.joins.iter().try_fold(base, |left, join| {
        let right = Box::new(lower_factor(&join.relation)?);
        let left = Box::new(left);
        let (kind, constraint) = match &join.join_operator {
            sq::JoinOperator::Join(c) => (JoinKind::Plain, c),
            sq::JoinOperator::Inner(c) => (JoinKind::Inner, c),
            sq::JoinOperator::Left(c) => (JoinKind::Left, c),
            sq::JoinOperator::LeftOuter(c) => (JoinKind::LeftOuter, c),
            sq::JoinOperator::Right(c) => (JoinKind::Right, c),
            sq::JoinOperator::RightOuter(c) => (JoinKind::RightOuter, c),
            sq::JoinOperator::FullOuter(c) => (JoinKind::FullOuter, c),
            _ => return Err(Error::unsupported_sql(format!("join `{join}`"))),
        };
        Ok(match constraint {
            sq::JoinConstraint::Natural if matches!(kind, JoinKind::Plain | JoinKind::Inner) => {
                FromNode::NaturalJoin { left, right }
            }
            sq::JoinConstraint::Natural => {
                return Err(Error::unsupported_sql(format!("outer natural join `{join}`")));
            }
            sq::JoinConstraint::On(condition) => FromNode::Join {
                left,
                right,
                kind,
                constraint: JoinConstraint::On(condition.to_string()),
            },
            sq::JoinConstraint::Using(columns) => FromNode::Join {
                left,
                right,
                kind,
                constraint: JoinConstraint::Using(
                    columns.iter().map(ToString::to_string).collect(),
                ),
            },
            sq::JoinConstraint::None => FromNode::Join {
                left,
                right,
                kind,
                constraint: JoinConstraint::None,
            },
        })
    })
}

fn lower_factor(factor: &sq::TableFactor) -> Result<FromNode> {
    match factor {
        sq::TableFactor::Table {
            name, alias, args, ..
        } if args.is_none() => Ok(FromNode::Table {
            name: name.to_string(),
            alias: alias.as_ref().map(|a| a.name.value.clone()),
        }),
        sq::TableFactor::Derived {
            lateral: false,
            subquery,
            alias,
            ..
        } => Ok(FromNode::SubQuery {
            query: Box::new(lower_query(subquery)?),
            alias: alias.as_ref().map(|a| a.name.value.clone()),
        }),
        sq::TableFactor::NestedJoin {
            table_with_joins,
            alias: None,
            ..
        } => Ok(FromNode::Nested(Box::new(lower_table_with_joins(
            table_with_joins,
        )?))),
        other => Err(Error::unsupported_sql(format!("table factor `{other}`"))),
    }
}

fn lower_predicate(expr: &sq::Expr) -> Result<Predicate> {
    match expr {
        sq::Expr::Nested(inner) => lower_predicate(inner),
        sq::Expr::BinaryOp {
            left,
            op: sq::BinaryOperator::And,
            right,
        } => Ok(Predicate::and(lower_predicate(left)?, lower_predicate(right)?)),
        sq::Expr::BinaryOp {
            left,
            op: sq::BinaryOperator::Or,
            right,
        } => Ok(Predicate::or(lower_predicate(left)?, lower_predicate(right)?)),
        sq::Expr::BinaryOp { left, op, right } => {
            let operator = match op {
                sq::BinaryOperator::Lt => ComparisonOp::Lt,
                sq::BinaryOperator::LtEq => ComparisonOp::LtEq,
                sq::BinaryOperator::Eq => ComparisonOp::Eq,
                sq::BinaryOperator::GtEq => ComparisonOp::GtEq,
                sq::BinaryOperator::Gt => ComparisonOp::Gt,
                sq::BinaryOperator::NotEq => ComparisonOp::NotEq,
                other => return Err(Error::unsupported_sql(format!("operator `{other}`"))),
            };
            Ok(Predicate::comparison(
                identifier(left)?,
                operator,
                lower_literal(right)?,
            ))
        }
        sq::Expr::Like {
            negated: false,
            any: false,
            expr,
            pattern,
            escape_char: None,
            ..
        } => Ok(Predicate::like(identifier(expr)?, lower_literal(pattern)?)),
        other => Err(Error::unsupported_sql(format!("predicate `{other}`"))),
    }
}

fn lower_literal(expr: &sq::Expr) -> Result<Literal> {
    match expr {
        sq::Expr::Value(value) => match &value.value {
            sq::Value::Number(n, _) => Ok(Literal::Number(n.to_string())),
            sq::Value::SingleQuotedString(s) => Ok(Literal::String(s.clone())),
            sq::Value::Boolean(b) => Ok(Literal::Boolean(*b)),
            sq::Value::Null => Ok(Literal::Null),
            other => Err(Error::unsupported_sql(format!("literal `{other}`"))),
        },
        sq::Expr::UnaryOp {
            op: sq::UnaryOperator::Plus,
            expr: inner,
        } => match lower_literal(inner)? {
            number @ Literal::Number(_) => Ok(number),
            _ => Err(Error::unsupported_sql(format!("literal `{expr}`"))),
        },
        sq::Expr::UnaryOp {
            op: sq::UnaryOperator::Minus,
            expr: inner,
        } => match lower_literal(inner)? {
            Literal::Number(n) => Ok(Literal::Number(format!("-{n}"))),
            _ => Err(Error::unsupported_sql(format!("literal `{expr}`"))),
        },
        sq::Expr::Nested(inner) => lower_literal(inner),
        other => Err(Error::unsupported_sql(format!(
            "expected a literal, got `{other}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(sql: &str) -> Result<Option<Select>> {
        SqlDialect::Generic.parse(sql)
    }

    #[rstest]
    #[case("")]
    #[case("   \n  ")]
    fn blank_text_is_the_empty_query(#[case] sql: &str) {
        assert_eq!(parse(sql).expect("blank parses"), None);
    }

    #[test]
    fn lowers_projection_items() {
        let select = parse("SELECT id, flights.delay, carriers.*, count(id) FROM flights")
            .expect("parses")
            .expect("not empty");
        assert_eq!(
            select.items,
            vec![
                ColumnRef::identifier("id"),
                ColumnRef::identifier("flights.delay"),
                ColumnRef::identifier("carriers.*"),
                ColumnRef::function("count", [ColumnRef::identifier("id")]),
            ]
        );
        assert_eq!(select.from, FromNode::table("flights"));
    }

    #[test]
    fn lowers_wildcard_and_natural_joins() {
        let select = parse("SELECT * FROM flights NATURAL JOIN carriers NATURAL JOIN airports")
            .expect("parses")
            .expect("not empty");
        assert_eq!(select.items, vec![ColumnRef::identifier("*")]);
        assert_eq!(
            select.from,
            FromNode::natural_join(
                FromNode::natural_join(FromNode::table("flights"), FromNode::table("carriers")),
                FromNode::table("airports"),
            )
        );
    }

    #[test]
    fn lowers_plain_joins_and_comma_lists() {
        let select = parse(
            "SELECT id FROM flights AS f JOIN carriers c ON f.carrier_id = c.carrier_id, airports",
        )
        .expect("parses")
        .expect("not empty");
        assert_eq!(
            select.from,
            FromNode::References(vec![
                FromNode::Join {
                    left: Box::new(FromNode::Table {
                        name: "flights".into(),
                        alias: Some("f".into()),
                    }),
                    right: Box::new(FromNode::Table {
                        name: "carriers".into(),
                        alias: Some("c".into()),
                    }),
                    kind: JoinKind::Plain,
                    constraint: JoinConstraint::On("f.carrier_id = c.carrier_id".into()),
                },
                FromNode::table("airports"),
            ])
        );
    }

    #[test]
    fn lowers_where_chains() {
        let select = parse(
            "SELECT id FROM flights WHERE delay >= 30 AND (city = 'nyc' OR name LIKE 'Del%') AND id <> -1",
        )
        .expect("parses")
        .expect("not empty");
        assert_eq!(
            select.selection,
            Some(Predicate::and(
                Predicate::and(
                    Predicate::comparison("delay", ComparisonOp::GtEq, Literal::number("30")),
                    Predicate::or(
                        Predicate::comparison("city", ComparisonOp::Eq, Literal::string("nyc")),
                        Predicate::like("name", Literal::string("Del%")),
                    ),
                ),
                Predicate::comparison("id", ComparisonOp::NotEq, Literal::number("-1")),
            ))
        );
    }

    #[test]
    fn lowers_group_and_order_by() {
        let select = parse("SELECT origin, count(id) FROM flights GROUP BY origin ORDER BY origin DESC, id")
            .expect("parses")
            .expect("not empty");
        assert_eq!(select.group_by, vec![ColumnRef::identifier("origin")]);
        assert_eq!(
            select.order_by,
            vec![
                OrderItem::new(ColumnRef::identifier("origin"), Some(false)),
                OrderItem::new(ColumnRef::identifier("id"), None),
            ]
        );
    }

    #[test]
    fn lowers_subqueries() {
        let select = parse("SELECT * FROM (SELECT id FROM flights) AS sub")
            .expect("parses")
            .expect("not empty");
        assert_eq!(
            select.from,
            FromNode::SubQuery {
                query: Box::new(Select::new(
                    [ColumnRef::identifier("id")],
                    FromNode::table("flights")
                )),
                alias: Some("sub".into()),
            }
        );
    }

    #[rstest]
    #[case("SELECT id AS ident FROM flights")]
    #[case("SELECT DISTINCT id FROM flights")]
    #[case("SELECT id FROM flights LIMIT 10")]
    #[case("SELECT id FROM flights WHERE id IN (1, 2)")]
    #[case("SELECT id FROM flights WHERE id = other_id")]
    #[case("SELECT id FROM flights WHERE name NOT LIKE 'a%'")]
    #[case("SELECT 1")]
    #[case("SELECT id FROM a UNION SELECT id FROM b")]
    #[case("SELECT id FROM a; SELECT id FROM b")]
    #[case("DELETE FROM flights")]
    #[case("WITH x AS (SELECT id FROM a) SELECT id FROM x")]
    fn rejects_sql_outside_the_subset(#[case] sql: &str) {
        let result = parse(sql);
        assert!(
            matches!(result, Err(Error::UnsupportedSql(_))),
            "expected UnsupportedSql for {sql:?}, got {result:?}"
        );
    }

    #[test]
    fn reports_parser_errors() {
        assert!(matches!(
            parse("SELECT id FROM flights WHERE"),
            Err(Error::InvalidQuery(_))
        ));
    }

    #[rstest]
    #[case(
        "SELECT id FROM flights",
        "sql parser error: Expected: end of statement, found: x at Line: 1, Column: 8",
        7
    )]
    #[case(
        "SELECT id\nFROM flights\nWHERE",
        "Expected: an expression, found: EOF at Line: 3, Column: 6",
        28
    )]
    #[case("SELECT", "Expected: an expression, found: EOF", 6)]
    #[case("SELECT", "at Line: 0, Column: 1", 6)]
    fn extracts_error_offsets(
        #[case] sql: &str,
        #[case] message: &str,
        #[case] expected: usize,
    ) {
        assert_eq!(error_offset(sql, message), expected);
    }

    #[rstest]
    #[case("generic", SqlDialect::Generic)]
    #[case("Postgres", SqlDialect::Postgres)]
    #[case("postgresql", SqlDialect::Postgres)]
    #[case("mysql", SqlDialect::MySql)]
    #[case("sqlite", SqlDialect::Sqlite)]
    fn parses_dialect_names(#[case] name: &str, #[case] expected: SqlDialect) {
        assert_eq!(name.parse::<SqlDialect>().ok(), Some(expected));
    }

    #[test]
    fn rejects_unknown_dialects() {
        assert!(matches!(
            "oracle".parse::<SqlDialect>(),
            Err(Error::Config(_))
        ));
    }

    #[rstest]
    #[case("SELECT id, carriers.* FROM flights NATURAL JOIN carriers WHERE delay >= 30 AND name LIKE 'Del%' ORDER BY id DESC")]
    #[case("SELECT * FROM flights AS f LEFT JOIN carriers AS c ON f.carrier_id = c.carrier_id")]
    #[case("SELECT id FROM a NATURAL JOIN (b NATURAL JOIN c)")]
    #[case("SELECT origin, count(id) FROM flights GROUP BY origin")]
    #[case("SELECT id FROM flights WHERE delay > 1 AND (city = 'o''hare' OR city = 'nyc')")]
    #[case(r#"SELECT "order", "my col", flights."from" FROM flights WHERE "my col" = 1"#)]
    #[case("SELECT id FROM flights WHERE delay > +5 AND delay < -2")]
    fn printed_trees_parse_back_identically(#[case] sql: &str) {
        let tree = parse(sql).expect("parses").expect("not empty");
        let printed = stringify(&tree);
        let reparsed = parse(&printed).expect("reparses").expect("not empty");
        assert_eq!(tree, reparsed, "printed as {printed:?}");
    }
}
