//! Read-only table/column metadata consumed by the editors.
//!
//! The engine only ever asks two questions of a catalog: which tables exist
//! (in declaration order) and which columns a table has (in declaration
//! order). Column order is meaningful, it drives star expansion.
crate::reexport!(datatype);
crate::reexport!(column);
crate::reexport!(table);
crate::reexport!(schema);

/// Source of table and column metadata.
pub trait Catalog {
    /// Table names in catalog order.
    fn tables(&self) -> Vec<&str>;

    /// Columns of `table` in declaration order, `None` if the table is unknown.
    fn columns_of(&self, table: &str) -> Option<&[Column]>;

    fn column(&self, table: &str, column: &str) -> Option<&Column> {
        self.columns_of(table)?.iter().find(|c| c.name == column)
    }
}

impl<C: Catalog + ?Sized> Catalog for &C {
    fn tables(&self) -> Vec<&str> {
        (**self).tables()
    }

    fn columns_of(&self, table: &str) -> Option<&[Column]> {
        (**self).columns_of(table)
    }
}
