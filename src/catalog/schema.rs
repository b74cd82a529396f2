use super::*;

/// In-memory catalog: an ordered set of tables.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    pub name: String,
    pub tables: Vec<Table>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    /// Insert (or overwrite, keeping its position) a table.
    pub fn insert_table(&mut self, table: Table) {
        match self.tables.iter_mut().find(|t| t.name == table.name) {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
    }

    pub fn with_table(mut self, table: Table) -> Self {
        self.insert_table(table);
        self
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }
}

impl Catalog for Schema {
    fn tables(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    fn columns_of(&self, table: &str) -> Option<&[Column]> {
        self.table(table).map(|t| t.columns.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new("public")
            .with_table(Table::new_with_ordered(
                "flights",
                [("id", DataType::Integer), ("delay", DataType::Integer)],
            ))
            .with_table(Table::new_with_ordered(
                "carriers",
                [("carrier_id", DataType::Integer), ("name", DataType::Text)],
            ))
    }

    #[test]
    fn lists_tables_in_insertion_order() {
        assert_eq!(Catalog::tables(&schema()), ["flights", "carriers"]);
    }

    #[test]
    fn looks_up_columns() {
        let schema = schema();
        assert_eq!(schema.columns_of("flights").map(<[Column]>::len), Some(2));
        assert!(schema.columns_of("missing").is_none());
        assert_eq!(
            schema.column("carriers", "name").map(|c| &c.data_type),
            Some(&DataType::Text)
        );
        assert!(schema.column("carriers", "delay").is_none());
    }

    #[test]
    fn reinserting_a_table_keeps_its_position() {
        let mut schema = schema();
        schema.insert_table(Table::new_with_ordered("flights", [("id", DataType::BigInt)]));
        assert_eq!(Catalog::tables(&schema), ["flights", "carriers"]);
        assert_eq!(schema.columns_of("flights").map(<[Column]>::len), Some(1));
    }
}
