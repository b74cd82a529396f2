use super::*;
use crate::*;

/// `flights(id, carrier_id, origin, dest, delay)`, `carriers(carrier_id, name)`
/// and `airports(code, city, state)`. Only `carrier_id` is shared.
#[fixture]
pub fn flights_catalog() -> Schema {
    common_init();
    Schema::new("public")
        .with_table(Table::new_with_ordered(
            "flights",
            [
                ("id", DataType::Integer),
                ("carrier_id", DataType::Integer),
                ("origin", DataType::VarChar(Some(3))),
                ("dest", DataType::VarChar(Some(3))),
                ("delay", DataType::Integer),
            ],
        ))
        .with_table(Table::new_with_ordered(
            "carriers",
            [("carrier_id", DataType::Integer), ("name", DataType::Text)],
        ))
        .with_table(Table::new_with_ordered(
            "airports",
            [
                ("code", DataType::VarChar(Some(3))),
                ("city", DataType::Text),
                ("state", DataType::Char(Some(2))),
            ],
        ))
}

/// Parse SQL the tests know to be valid.
pub fn parsed(sql: &str) -> Select {
    SqlDialect::Generic
        .parse_select(sql)
        .unwrap_or_else(|e| panic!("fixture SQL {sql:?} should parse: {e}"))
}
