//! The "current query" slot a UI edits one gesture at a time.
use crate::*;

/// Why the last [`QueryBuilder::load`] was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub message: String,
    /// Byte offset of the offending token for syntax errors; the end of the
    /// text when the parser ran out of input. `None` for SQL that parsed but
    /// is outside the supported subset.
    pub offset: Option<usize>,
}

/// Owns a catalog and at most one query, applying edits atomically: a failed
/// edit leaves the previous query in place.
pub struct QueryBuilder<C: Catalog> {
    catalog: C,
    options: EditOptions,
    query: Option<Select>,
    last_error: Option<ParseFailure>,
}

impl<C: Catalog> QueryBuilder<C> {
    /// A builder using the environment configuration.
    pub fn new(catalog: C) -> Result<Self> {
        Ok(Self::with_options(catalog, EditOptions::from_config()?))
    }

    pub fn with_options(catalog: C, options: EditOptions) -> Self {
        Self {
            catalog,
            options,
            query: None,
            last_error: None,
        }
    }

    pub fn query(&self) -> Option<&Select> {
        self.query.as_ref()
    }

    pub fn last_error(&self) -> Option<&ParseFailure> {
        self.last_error.as_ref()
    }

    /// Printed SQL of the current query, empty when there is none.
    pub fn sql(&self) -> String {
        self.query.as_ref().map(stringify).unwrap_or_default()
    }

    /// Resolved projection of the current query.
    pub fn columns(&self) -> Vec<String> {
        self.query
            .as_ref()
            .map(|query| self.editor().projection().resolve(query))
            .unwrap_or_default()
    }

    pub fn tables(&self) -> Vec<String> {
        self.query.as_ref().map(JoinGraph::tables).unwrap_or_default()
    }

    /// Replace the current query with hand-written SQL. Blank text clears it.
    /// On failure the previous query stays and the error is kept for
    /// [`QueryBuilder::last_error`].
    pub fn load(&mut self, sql: &str) -> Result {
        match self.options.dialect.parse(sql) {
            Ok(query) => {
                self.query = query;
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                warn!(%message, "Rejected query text");
                let offset = matches!(e, Error::InvalidQuery(_)).then(|| error_offset(sql, &message));
                self.last_error = Some(ParseFailure { message, offset });
                Err(e)
            }
        }
    }

    /// Add a `table.column` (or `table.*`) reference.
    pub fn add_column(&mut self, qualified: &str) -> Result {
        let Some((table, column)) = qualified.rsplit_once('.') else {
            return Err(Error::unsupported_edit(format!(
                "{qualified:?} is not of the form table.column"
            )));
        };
        let edited = self.editor().add_column(self.query.as_ref(), table, column)?;
        self.query = Some(edited);
        Ok(())
    }

    pub fn remove_column(&mut self, column: &str) -> Result {
        let edited = self.editor().remove_column(self.current()?, column)?;
        self.query = edited;
        Ok(())
    }

    pub fn set_filter(&mut self, column: &str, operator: &str, value: &str) -> Result {
        let edited = self
            .editor()
            .set_filter(self.current()?, column, operator, value)?;
        self.query = Some(edited);
        Ok(())
    }

    pub fn filter_for(&self, column: &str) -> Option<Filter> {
        self.editor().filter_for(self.query.as_ref()?, column)
    }

    pub fn clear_filters(&mut self) {
        if let Some(query) = &self.query {
            self.query = Some(self.editor().clear_filters(query));
        }
    }

    pub fn order_by(&mut self, column: &str, ascending: Option<bool>) -> Result {
        let edited = self.editor().order_by(self.current()?, column, ascending)?;
        self.query = Some(edited);
        Ok(())
    }

    pub fn remove_order(&mut self, column: &str) -> Result {
        let edited = self.editor().remove_order(self.current()?, column)?;
        self.query = Some(edited);
        Ok(())
    }

    pub fn clear_order(&mut self) {
        if let Some(query) = &self.query {
            self.query = Some(self.editor().clear_order(query));
        }
    }

    pub fn clear(&mut self) {
        self.query = None;
        self.last_error = None;
    }

    fn editor(&self) -> QueryEditor<'_, C> {
        QueryEditor::with_options(&self.catalog, self.options.clone())
    }

    fn current(&self) -> Result<&Select> {
        self.query
            .as_ref()
            .ok_or_else(|| Error::unsupported_edit("there is no query to edit"))
    }
}
