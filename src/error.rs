use thiserror::Error;

/// エラー型の定義
#[derive(Error, Debug)]
pub enum Error {
    #[error("no group by specification supplied")]
    NoGroupBy,

    #[error("no groups to aggregate")]
    NoGroups,

    #[error("groups are not bound to a source table")]
    NilTable,

    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    #[error("column '{0}' already exists")]
    DuplicateColumnName(String),

    #[error("unknown aggregation '{0}'")]
    UnknownAggregation(String),

    #[error("unknown column type '{0}'")]
    UnknownColumnType(String),

    #[error("column type name is empty")]
    EmptyTypeName,

    #[error("column type '{0}' has no series constructor")]
    NilConstructor(String),

    #[error("column type '{0}' already exists")]
    TypeAlreadyRegistered(String),

    #[error("malformed join key specification: {0}")]
    InvalidJoinSpec(String),

    #[error("row arity mismatch: expected {expected} values, found {found}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("incompatible column options: {0}")]
    IncompatibleOptions(String),

    #[error("index out of bounds: index {index}, size {size}")]
    IndexOutOfBounds { index: usize, size: usize },

    #[error("expression error: {0}")]
    Expression(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error")]
    Io(#[source] std::io::Error),

    #[error("csv error")]
    Csv(#[source] csv::Error),

    #[error("json error")]
    Json(#[source] serde_json::Error),
}

/// Coarse classification of [`Error`] values.
///
/// `Configuration` errors come from setting the engine up (registry, config
/// files), `Data` errors from the content of a particular table,
/// `Invariant` errors from calling an engine without the inputs it requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Data,
    Invariant,
    Expression,
    Io,
}

impl Error {
    /// Returns the class this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyTypeName
            | Error::NilConstructor(_)
            | Error::TypeAlreadyRegistered(_)
            | Error::UnknownColumnType(_)
            | Error::UnknownAggregation(_)
            | Error::IncompatibleOptions(_)
            | Error::Config(_) => ErrorKind::Configuration,
            Error::ColumnNotFound(_)
            | Error::DuplicateColumnName(_)
            | Error::InvalidJoinSpec(_)
            | Error::ArityMismatch { .. }
            | Error::IndexOutOfBounds { .. } => ErrorKind::Data,
            Error::NoGroupBy | Error::NoGroups | Error::NilTable => ErrorKind::Invariant,
            Error::Expression(_) => ErrorKind::Expression,
            Error::Io(_) | Error::Csv(_) | Error::Json(_) => ErrorKind::Io,
        }
    }
}

/// Resultの型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Csv(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Config(err.to_string())
    }
}
