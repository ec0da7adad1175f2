use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),

    #[error("Invalid field name: {0}")]
    InvalidColumn(String),

    #[error("Field '{0}' cannot be queried")]
    HiddenColumn(String),

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Invalid operator data: {0}")]
    InvalidOperatorData(String),
}
