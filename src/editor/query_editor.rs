use crate::*;

/// User gestures (drag a column in, drop it, filter, sort) expressed as edits
/// on a [`Select`].
///
/// The editor never mutates its input: each call returns a new tree or an
/// error, and the caller decides whether to adopt it.
pub struct QueryEditor<'c, C: Catalog + ?Sized> {
    catalog: &'c C,
    options: EditOptions,
}

impl<'c, C: Catalog + ?Sized> QueryEditor<'c, C> {
    pub fn new(catalog: &'c C) -> Self {
        Self::with_options(catalog, EditOptions::default())
    }

    pub fn with_options(catalog: &'c C, options: EditOptions) -> Self {
        Self { catalog, options }
    }

    pub fn projection(&self) -> Projection<'c, C> {
        Projection::with_options(self.catalog, &self.options)
    }

    /// Add `table.column` to `query`, natural-joining `table` when the query
    /// does not read from it yet. Without a query, start `SELECT column FROM table`.
    pub fn add_column(&self, query: Option<&Select>, table: &str, column: &str) -> Result<Select> {
        let columns = self
            .catalog
            .columns_of(table)
            .ok_or_else(|| Error::UnknownTable(table.to_string()))?;
        if column != "*" && columns.iter().all(|c| c.name != column) {
            return Err(Error::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            });
        }

        let Some(query) = query else {
            info!("Starting a new query on {table}");
            return Ok(Select::new(
                [ColumnRef::identifier(column)],
                FromNode::table(table),
            ));
        };
        query.validate()?;

        let projection = self.projection();
        let mut edited = if column == "*" || !projection.resolve(query).iter().any(|c| c == column) {
            projection.add_column(query, column, table)?
        } else {
            query.clone()
        };
        if !JoinGraph::tables(query).iter().any(|t| t == table) {
            edited = JoinGraph::add_natural_join(&edited, table)?;
        }
        Ok(edited)
    }

    /// Remove `column` (qualified or not) from the projection, dropping filters,
    /// grouping, ordering and tables that only existed for it.
    ///
    /// `Ok(None)` means the last column went and the query is now empty.
    pub fn remove_column(&self, query: &Select, column: &str) -> Result<Option<Select>> {
        query.validate()?;
        let column = projected_name(column);
        let projection = self.projection();
        let resolved = projection.resolve(query);
        if !resolved.iter().any(|c| c == column) {
            debug!("{column} is not projected, nothing to remove");
            return Ok(Some(query.clone()));
        }
        if resolved.len() == 1 {
            info!("Removed the last column, clearing the query");
            return Ok(None);
        }
        projection.remove_column(query, column).map(Some)
    }

    /// Replace the filter on `column`. An empty `value` only clears it.
    ///
    /// `LIKE` values get the configured suffix. Other values are typed by the
    /// column's catalog type, falling back to a number when the text looks
    /// like one.
    pub fn set_filter(&self, query: &Select, column: &str, operator: &str, value: &str) -> Result<Select> {
        query.validate()?;
        let operator: FilterOperator = operator.parse()?;
        let cleared = Predicates::remove(query, column, operator)?;
        let value = value.trim();
        if value.is_empty() {
            return Ok(cleared);
        }
        let literal = self.literal(query, column, operator, value)?;
        Predicates::append(&cleared, column, operator, literal)
    }

    fn literal(&self, query: &Select, column: &str, operator: FilterOperator, value: &str) -> Result<Literal> {
        if operator == FilterOperator::Like {
            return Ok(Literal::string(format!("{value}{}", self.options.like_suffix)));
        }
        let invalid = || Error::InvalidValue {
            column: column.to_string(),
            value: value.to_string(),
        };
        let name = projected_name(column);
        let data_type = JoinGraph::tables(query)
            .iter()
            .find_map(|table| self.catalog.column(table, name))
            .map(|c| &c.data_type);

        match data_type {
            Some(data_type) if data_type.is_numeric() => number(value).ok_or_else(invalid),
            Some(data_type) if data_type.is_textual() => Ok(Literal::string(value)),
            Some(DataType::Boolean) => value
                .parse()
                .map(Literal::Boolean)
                .map_err(|_| invalid()),
            _ => Ok(number(value).unwrap_or_else(|| Literal::string(value))),
        }
    }

    /// The filter currently applied to `column`, with LIKE wildcards stripped.
    pub fn filter_for(&self, query: &Select, column: &str) -> Option<Filter> {
        match Predicates::find(query, column)? {
            Predicate::Like { pattern, .. } => {
                let pattern = pattern.value();
                let value = pattern.strip_prefix('%').unwrap_or(&pattern);
                let value = value.strip_suffix('%').unwrap_or(value);
                Some(Filter {
                    operator: FilterOperator::Like,
                    value: value.to_string(),
                })
            }
            Predicate::Comparison { operator, value, .. } => Some(Filter {
                operator: FilterOperator::Compare(*operator),
                value: value.value(),
            }),
            Predicate::And { .. } | Predicate::Or { .. } => None,
        }
    }

    pub fn clear_filters(&self, query: &Select) -> Select {
        Select {
            selection: None,
            ..query.clone()
        }
    }

    /// Sort by `column`, moving it to the end of `ORDER BY` if it was already there.
    pub fn order_by(&self, query: &Select, column: &str, ascending: Option<bool>) -> Result<Select> {
        let mut edited = self.remove_order(query, column)?;
        let name = projected_name(column);
        let available = self.projection().resolve(query).iter().any(|c| c == name)
            || JoinGraph::tables(query)
                .iter()
                .any(|table| self.catalog.column(table, name).is_some());
        if !available {
            return Err(Error::unsupported_edit(format!(
                "{column} is not available from the query's tables"
            )));
        }
        edited
            .order_by
            .push(OrderItem::new(ColumnRef::identifier(column), ascending));
        Ok(edited)
    }

    pub fn remove_order(&self, query: &Select, column: &str) -> Result<Select> {
        query.validate()?;
        let name = projected_name(column);
        let mut edited = query.clone();
        edited
            .order_by
            .retain(|item| resolved_name(&item.column).as_deref() != Some(name));
        Ok(edited)
    }

    pub fn clear_order(&self, query: &Select) -> Select {
        Select {
            order_by: Vec::new(),
            ..query.clone()
        }
    }
}

/// A number literal, kept as typed apart from a redundant leading `+`.
fn number(value: &str) -> Option<Literal> {
    let value = value.strip_prefix('+').unwrap_or(value);
    value
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(|_| Literal::number(value))
}
