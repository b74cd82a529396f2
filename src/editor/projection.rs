//! Projection bookkeeping: expanding stars against the catalog, collapsing
//! fully covered tables back into stars, and deciding which tables a set of
//! columns still needs.
use crate::*;
use itertools::Itertools as _;
use std::collections::HashSet;

pub struct Projection<'c, C: Catalog + ?Sized> {
    catalog: &'c C,
    dialect: SqlDialect,
    compress_stars: bool,
}

impl<'c, C: Catalog + ?Sized> Projection<'c, C> {
    pub fn new(catalog: &'c C) -> Self {
        Self::with_options(catalog, &EditOptions::default())
    }

    pub fn with_options(catalog: &'c C, options: &EditOptions) -> Self {
        Self {
            catalog,
            dialect: options.dialect,
            compress_stars: options.compress_stars,
        }
    }

    /// Concrete column names the projection produces, without duplicates.
    ///
    /// `*` expands every table of the query and `t.*` expands `t`, both in
    /// catalog order. Qualified columns lose their qualifier; function calls
    /// appear as their compact rendering.
    pub fn resolve(&self, select: &Select) -> Vec<String> {
        let tables = JoinGraph::tables(select);
        select
            .items
            .iter()
            .flat_map(|item| self.expand(item, &tables))
            .unique()
            .collect()
    }

    fn expand(&self, item: &ColumnRef, tables: &[String]) -> Vec<String> {
        match item.target() {
            Some(Target::Wildcard) => tables.iter().flat_map(|t| self.column_names(t)).collect(),
            Some(Target::TableWildcard(table)) => self.column_names(table),
            Some(Target::Column { name, .. }) => vec![name.to_string()],
            None => vec![item.raw()],
        }
    }

    fn column_names(&self, table: &str) -> Vec<String> {
        self.catalog
            .columns_of(table)
            .map(|columns| columns.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Replace every table whose catalog columns all appear in `columns` with
    /// `table.*` (prepended), then collapse to `*` when every entry is a table
    /// star and there is one per table.
    pub fn compress(&self, columns: &[String], tables: &[String]) -> Vec<String> {
        let mut compressed = columns.to_vec();
        for table in tables {
            let Some(table_columns) = self.catalog.columns_of(table).filter(|c| !c.is_empty())
            else {
                continue;
            };
            if table_columns.iter().all(|c| columns.contains(&c.name)) {
                compressed.retain(|column| table_columns.iter().all(|c| &c.name != column));
                compressed.insert(0, format!("{table}.*"));
            }
        }

        let starred = compressed.iter().filter(|c| c.ends_with(".*")).count();
        if !compressed.is_empty() && starred == compressed.len() && starred == tables.len() {
            return vec!["*".to_string()];
        }
        compressed
    }

    /// Smallest useful set of catalog tables covering `columns`.
    pub fn tables_for_columns(&self, columns: &[String]) -> Vec<String> {
        let candidates = self
            .catalog
            .tables()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        self.tables_for_columns_within(columns, &candidates)
    }

    /// Like [`Projection::tables_for_columns`], restricted to `candidates`.
    ///
    /// A candidate supplying two or more of the columns is always kept. A
    /// candidate supplying a single column is kept unless that column is
    /// already supplied by a table kept before it (multi-column tables count
    /// as first). Output follows candidate order.
    pub fn tables_for_columns_within(&self, columns: &[String], candidates: &[String]) -> Vec<String> {
        let contributions = candidates
            .iter()
            .filter_map(|table| {
                let supplied = self
                    .catalog
                    .columns_of(table)?
                    .iter()
                    .map(|c| c.name.as_str())
                    .filter(|name| columns.iter().any(|c| c == name))
                    .collect::<Vec<_>>();
                (!supplied.is_empty()).then_some((table, supplied))
            })
            .collect::<Vec<_>>();

        let mut supplied: HashSet<&str> = contributions
            .iter()
            .filter(|(_, names)| names.len() > 1)
            .flat_map(|(_, names)| names.iter().copied())
            .collect();

        contributions
            .into_iter()
            .filter(|(_, names)| names.len() > 1 || supplied.insert(names[0]))
            .map(|(table, _)| table.clone())
            .collect()
    }

    /// Append `column` of `table` to the projection (`*` appends `table.*`)
    /// and recompress against the query's tables plus `table`. The `FROM`
    /// clause is left alone.
    pub fn add_column(&self, select: &Select, column: &str, table: &str) -> Result<Select> {
        select.validate()?;
        let mut edited = select.clone();
        edited.items.push(match column {
            "*" => ColumnRef::identifier(format!("{table}.*")),
            _ => ColumnRef::identifier(column),
        });

        let columns = self.resolve(&edited);
        let tables = std::iter::once(table.to_string())
            .chain(JoinGraph::tables(&edited))
            .unique()
            .collect::<Vec<_>>();
        let columns = self.maybe_compress(columns, &tables);
        debug!(?columns, "Projection after adding {table}.{column}");
        edited.items = rebuild_items(&edited.items, columns);
        Ok(edited)
    }

    /// Drop `column` from the projection along with every `WHERE` leaf and
    /// `GROUP BY`/`ORDER BY` key on it, then prune tables nothing references
    /// any more. Fails when the pruned tables are not natural-joined.
    pub fn remove_column(&self, select: &Select, column: &str) -> Result<Select> {
        select.validate()?;
        let column = projected_name(column);
        let remaining = self
            .resolve(select)
            .into_iter()
            .filter(|c| c != column)
            .collect::<Vec<_>>();
        if remaining.is_empty() {
            return Err(Error::unsupported_edit(format!(
                "removing {column} would leave an empty projection"
            )));
        }

        let mut edited = select.clone();
        edited.selection = select
            .selection
            .as_ref()
            .and_then(|root| Predicates::prune(root, &|leaf| leaf.column().map(projected_name) != Some(column)));
        edited.group_by.retain(|key| resolved_name(key).as_deref() != Some(column));
        edited
            .order_by
            .retain(|item| resolved_name(&item.column).as_deref() != Some(column));

        let edited = self.prune_tables(edited, &remaining)?;
        let tables = JoinGraph::tables(&edited);
        let columns = self.maybe_compress(remaining, &tables);
        debug!(?columns, "Projection after removing {column}");
        Ok(Select {
            items: rebuild_items(&select.items, columns),
            ..edited
        })
    }

    fn prune_tables(&self, select: Select, remaining: &[String]) -> Result<Select> {
        let mut references = remaining.to_vec();
        if let Some(selection) = &select.selection {
            references.extend(selection.columns().into_iter().map(|c| projected_name(c).to_string()));
        }
        let keys = select
            .group_by
            .iter()
            .chain(select.order_by.iter().map(|item| &item.column));
        references.extend(keys.clone().filter_map(resolved_name));
        let calls = select
            .items
            .iter()
            .filter(|item| remaining.contains(&item.raw()))
            .chain(keys);
        references.extend(calls.flat_map(argument_columns));

        let current = JoinGraph::tables(&select);
        let needed = match self.tables_for_columns_within(&references, &current) {
            needed if needed.is_empty() => current.clone(),
            needed => needed,
        };
        let stale = current.iter().filter(|t| !needed.contains(t)).collect::<Vec<_>>();

        match stale.as_slice() {
            [] => Ok(select),
            [_, _, ..] if select.from.is_natural_chain() => {
                info!(?stale, "Rebuilding FROM without unused tables");
                let from = JoinGraph::rebuild_from(self.dialect, &needed)?;
                Ok(JoinGraph::replace_from(&select, from))
            }
            _ => {
                let pruned = stale
                    .iter()
                    .try_fold(select, |select, table| JoinGraph::remove_natural_join(&select, table))?;
                let stuck = JoinGraph::tables(&pruned)
                    .into_iter()
                    .filter(|t| stale.iter().any(|s| *s == t))
                    .collect::<Vec<_>>();
                if !stuck.is_empty() {
                    return Err(Error::unsupported_edit(format!(
                        "{} no longer needed but not natural-joined",
                        stuck.iter().join(", ")
                    )));
                }
                Ok(pruned)
            }
        }
    }

    fn maybe_compress(&self, columns: Vec<String>, tables: &[String]) -> Vec<String> {
        if self.compress_stars {
            self.compress(&columns, tables)
        } else {
            columns
        }
    }
}

/// Plain columns read by a function call's arguments, nested calls included.
fn argument_columns(column: &ColumnRef) -> Vec<String> {
    match column {
        ColumnRef::Identifier(_) => Vec::new(),
        ColumnRef::FunctionCall { args, .. } => args
            .iter()
            .flat_map(|arg| match arg {
                ColumnRef::Identifier(text) => vec![projected_name(text).to_string()],
                call => argument_columns(call),
            })
            .collect(),
    }
}

/// Turn resolved names back into projection items, reusing function-call nodes
/// from `original` whose rendering matches.
fn rebuild_items(original: &[ColumnRef], columns: Vec<String>) -> Vec<ColumnRef> {
    columns
        .into_iter()
        .map(|column| {
            original
                .iter()
                .find(|item| matches!(item, ColumnRef::FunctionCall { .. }) && item.raw() == column)
                .cloned()
                .unwrap_or(ColumnRef::Identifier(column))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[rstest]
    #[case("SELECT * FROM carriers", &["carrier_id", "name"])]
    #[case("SELECT carriers.*, id FROM carriers", &["carrier_id", "name", "id"])]
    #[case("SELECT flights.id, id, delay FROM flights", &["id", "delay"])]
    #[case("SELECT count(id), origin FROM flights", &["count(id)", "origin"])]
    #[case("SELECT nope.* FROM flights", &[])]
    #[case(
        "SELECT * FROM flights NATURAL JOIN carriers",
        &["id", "carrier_id", "origin", "dest", "delay", "name"]
    )]
    fn resolves_projection(flights_catalog: Schema, #[case] sql: &str, #[case] expected: &[&str]) {
        let projection = Projection::new(&flights_catalog);
        assert_eq!(projection.resolve(&parsed(sql)), expected);
    }

    #[rstest]
    fn compresses_covered_tables(flights_catalog: Schema) {
        let projection = Projection::new(&flights_catalog);
        let columns = strings(&["id", "carrier_id", "name"]);
        let tables = strings(&["flights", "carriers"]);
        assert_eq!(projection.compress(&columns, &tables), ["carriers.*", "id"]);

        let everything = strings(&["carrier_id", "name"]);
        assert_eq!(projection.compress(&everything, &strings(&["carriers"])), ["*"]);
    }

    #[rstest]
    fn compress_is_idempotent(flights_catalog: Schema) {
        let projection = Projection::new(&flights_catalog);
        let tables = strings(&["flights", "carriers"]);
        let once = projection.compress(&strings(&["id", "carrier_id", "name", "delay"]), &tables);
        assert_eq!(projection.compress(&once, &tables), once);
    }

    #[test]
    fn whole_single_table_collapses_to_star() {
        let catalog = Schema::new("public").with_table(Table::new_with_ordered(
            "flights",
            [("id", DataType::Integer), ("name", DataType::Text)],
        ));
        let projection = Projection::new(&catalog);
        let query = parsed("SELECT id, name FROM flights");
        let columns = projection.resolve(&query);
        assert_eq!(projection.compress(&columns, &JoinGraph::tables(&query)), ["*"]);
    }

    #[rstest]
    #[case(&["id", "delay"], &["flights"])]
    #[case(&["name"], &["carriers"])]
    #[case(&["carrier_id"], &["flights"])]
    #[case(&["id", "name"], &["flights", "carriers"])]
    #[case(&["city", "delay"], &["flights", "airports"])]
    #[case(&["nothing"], &[])]
    fn picks_tables_for_columns(
        flights_catalog: Schema,
        #[case] columns: &[&str],
        #[case] expected: &[&str],
    ) {
        let projection = Projection::new(&flights_catalog);
        assert_eq!(projection.tables_for_columns(&strings(columns)), expected);
    }

    #[rstest]
    fn single_column_tables_are_kept_in_candidate_order(flights_catalog: Schema) {
        let projection = Projection::new(&flights_catalog);
        let candidates = strings(&["carriers", "flights"]);
        assert_eq!(
            projection.tables_for_columns_within(&strings(&["carrier_id"]), &candidates),
            ["carriers"]
        );
    }

    #[rstest]
    fn adds_columns_and_recompresses(flights_catalog: Schema) {
        let projection = Projection::new(&flights_catalog);
        let query = parsed("SELECT carrier_id FROM carriers");
        let edited = projection.add_column(&query, "name", "carriers").unwrap();
        assert_eq!(stringify(&edited), "SELECT * FROM carriers");

        let edited = projection.add_column(&query, "*", "carriers").unwrap();
        assert_eq!(stringify(&edited), "SELECT * FROM carriers");
    }

    #[rstest]
    fn keeps_function_calls_when_rebuilding(flights_catalog: Schema) {
        let projection = Projection::new(&flights_catalog);
        let query = parsed("SELECT count(id) FROM flights");
        let edited = projection.add_column(&query, "delay", "flights").unwrap();
        assert_eq!(
            edited.items,
            [ColumnRef::function("count", [ColumnRef::identifier("id")]), ColumnRef::identifier("delay")]
        );
    }

    #[rstest]
    fn uncompressed_projection_stays_explicit(flights_catalog: Schema) {
        let options = EditOptions {
            compress_stars: false,
            ..EditOptions::default()
        };
        let projection = Projection::with_options(&flights_catalog, &options);
        let query = parsed("SELECT carrier_id FROM carriers");
        let edited = projection.add_column(&query, "name", "carriers").unwrap();
        assert_eq!(stringify(&edited), "SELECT carrier_id, name FROM carriers");
    }

    #[rstest]
    fn removes_column_and_everything_on_it(flights_catalog: Schema) {
        let projection = Projection::new(&flights_catalog);
        let query = parsed(
            "SELECT id, delay, origin FROM flights WHERE delay > 5 AND origin = 'JFK' \
             GROUP BY delay, origin ORDER BY delay DESC",
        );
        let edited = projection.remove_column(&query, "flights.delay").unwrap();
        assert_eq!(
            stringify(&edited),
            "SELECT id, origin FROM flights WHERE origin = 'JFK' GROUP BY origin"
        );
    }

    #[rstest]
    fn removing_a_tables_last_column_drops_the_table(flights_catalog: Schema) {
        let projection = Projection::new(&flights_catalog);
        let query = parsed("SELECT id, name FROM flights NATURAL JOIN carriers");
        let edited = projection.remove_column(&query, "name").unwrap();
        assert_eq!(stringify(&edited), "SELECT id FROM flights");
    }

    #[rstest]
    fn rebuilds_from_when_several_tables_go(flights_catalog: Schema) {
        let projection = Projection::new(&flights_catalog);
        let query = parsed(
            "SELECT name, city, code FROM flights NATURAL JOIN carriers NATURAL JOIN airports",
        );
        let edited = projection.remove_column(&query, "name").unwrap();
        assert_eq!(stringify(&edited), "SELECT city, code FROM airports");
    }

    #[rstest]
    fn aliased_chains_keep_their_aliases(flights_catalog: Schema) {
        let projection = Projection::new(&flights_catalog);
        let query = parsed(
            "SELECT name, code FROM carriers AS c NATURAL JOIN flights NATURAL JOIN airports \
             WHERE c.name LIKE 'A%'",
        );
        let edited = projection.remove_column(&query, "code").unwrap();
        assert_eq!(
            stringify(&edited),
            "SELECT name FROM carriers AS c WHERE c.name LIKE 'A%'"
        );
    }

    #[rstest]
    #[case("SELECT count(id), origin, name FROM flights NATURAL JOIN carriers", "origin")]
    #[case("SELECT origin, name FROM flights NATURAL JOIN carriers ORDER BY max(delay)", "origin")]
    fn function_arguments_keep_their_table(
        flights_catalog: Schema,
        #[case] sql: &str,
        #[case] column: &str,
    ) {
        let projection = Projection::new(&flights_catalog);
        let edited = projection.remove_column(&parsed(sql), column).unwrap();
        assert_eq!(JoinGraph::tables(&edited), ["flights", "carriers"]);
    }

    #[rstest]
    fn removing_a_call_releases_its_arguments(flights_catalog: Schema) {
        let projection = Projection::new(&flights_catalog);
        let query = parsed("SELECT count(id), name FROM flights NATURAL JOIN carriers");
        let edited = projection.remove_column(&query, "count(id)").unwrap();
        assert_eq!(stringify(&edited), "SELECT name FROM carriers");
    }

    #[rstest]
    fn refuses_to_prune_explicit_joins(flights_catalog: Schema) {
        let projection = Projection::new(&flights_catalog);
        let query = parsed(
            "SELECT id, name FROM flights JOIN carriers ON flights.carrier_id = carriers.carrier_id",
        );
        assert!(matches!(
            projection.remove_column(&query, "name"),
            Err(Error::UnsupportedEdit(_))
        ));
    }

    #[rstest]
    fn filters_keep_their_table_alive(flights_catalog: Schema) {
        let projection = Projection::new(&flights_catalog);
        let query = parsed("SELECT id, name FROM flights NATURAL JOIN carriers WHERE delay > 5");
        let edited = projection.remove_column(&query, "id").unwrap();
        assert_eq!(
            stringify(&edited),
            "SELECT name FROM flights NATURAL JOIN carriers WHERE delay > 5"
        );
    }
}
