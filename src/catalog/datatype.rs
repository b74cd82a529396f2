use derive_more::Display;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum DataType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    #[display("Numeric({_0}, {_1})")]
    Numeric(usize, usize),
    Float,
    Double,
    #[display("Char({})", _0.map_or_else(|| "None".to_string(), |v| v.to_string()))]
    Char(Option<usize>),
    #[display("VarChar({})", _0.map_or_else(|| "None".to_string(), |v| v.to_string()))]
    VarChar(Option<usize>),
    Text,
    Date,
    Time,
    Timestamp,
    Uuid,
    Json,
}

impl DataType {
    /// Values of this type are written as bare numeric literals.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::SmallInt
                | DataType::Integer
                | DataType::BigInt
                | DataType::Numeric(..)
                | DataType::Float
                | DataType::Double
        )
    }

    /// Values of this type are written as quoted string literals.
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            DataType::Char(_)
                | DataType::VarChar(_)
                | DataType::Text
                | DataType::Date
                | DataType::Time
                | DataType::Timestamp
                | DataType::Uuid
                | DataType::Json
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DataType::Integer, "Integer")]
    #[case(DataType::Numeric(10, 2), "Numeric(10, 2)")]
    #[case(DataType::VarChar(Some(64)), "VarChar(64)")]
    #[case(DataType::Char(None), "Char(None)")]
    fn displays_type_names(#[case] data_type: DataType, #[case] expected: &str) {
        assert_eq!(data_type.to_string(), expected);
    }

    #[test]
    fn numeric_and_textual_are_disjoint() {
        for dt in [
            DataType::Boolean,
            DataType::Integer,
            DataType::Double,
            DataType::Text,
            DataType::Timestamp,
        ] {
            assert!(!(dt.is_numeric() && dt.is_textual()), "{dt} is both");
        }
        assert!(!DataType::Boolean.is_numeric());
        assert!(!DataType::Boolean.is_textual());
    }
}
