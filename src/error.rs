use sqlparser::parser::ParserError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid query: {0}")]
    InvalidQuery(ParserError),

    #[error("Unsupported SQL: {0}")]
    UnsupportedSql(String),

    #[error("Malformed query tree: {0}")]
    MalformedTree(String),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Unknown column: {table}.{column}")]
    UnknownColumn { table: String, column: String },

    #[error("Unsupported edit: {0}")]
    UnsupportedEdit(String),

    #[error("Invalid value {value:?} for column {column}")]
    InvalidValue { column: String, value: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T = ()> = std::result::Result<T, Error>;

impl From<ParserError> for Error {
    fn from(value: ParserError) -> Self {
        Error::InvalidQuery(value)
    }
}

impl Error {
    pub(crate) fn malformed(detail: impl Into<String>) -> Self {
        Error::MalformedTree(detail.into())
    }

    pub(crate) fn unsupported_sql(detail: impl Into<String>) -> Self {
        Error::UnsupportedSql(detail.into())
    }

    pub(crate) fn unsupported_edit(detail: impl Into<String>) -> Self {
        Error::UnsupportedEdit(detail.into())
    }
}
