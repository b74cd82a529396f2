#![cfg(test)]
crate::reexport!(fixtures);
pub use rstest::*;

pub(crate) fn common_init() {
    use std::sync::Once;
    use tracing_subscriber::EnvFilter;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        // Only initialize once for all tests
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env()) // <- reads RUST_LOG
            .with_test_writer() // ensures it integrates with `cargo test` output
            .init();
    });
}

mod fixture_tests {
    use super::{super::*, *};

    #[rstest]
    fn catalog_lists_tables_in_order(flights_catalog: Schema) {
        assert_eq!(flights_catalog.tables(), ["flights", "carriers", "airports"]);
    }

    #[test]
    fn parsed_fixture_sql_is_valid() {
        parsed("SELECT id FROM flights").validate().unwrap();
    }
}
