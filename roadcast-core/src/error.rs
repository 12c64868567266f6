/// Error types for road weather tables and collections
use thiserror::Error;

/// Main error type for table, attribute and station operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    /// Mutation attempted on a locked table
    #[error("This table is READONLY")]
    ReadOnly,

    /// Column name already present in the table
    #[error("Cant append column '{0}'. This column name already exist")]
    DuplicateColumn(String),

    /// Column name not present in the table
    #[error("{name} is not a valid column name. Valid column name are: {valid:?}")]
    InvalidColumnName { name: String, valid: Vec<String> },

    /// Physical column index beyond the matrix width
    #[error("Array does not contain this indice: {index} (matrix width: {width})")]
    OutOfBounds { index: usize, width: usize },

    /// Column length differs from the table row count
    #[error("Array does not have the right lenght. Array length: {found}, Matrix length: {expected}")]
    LengthMismatch { expected: usize, found: usize },

    /// Row length differs from the physical column count
    #[error("Row has {found} values but the table has {expected} physical columns")]
    RowWidth { expected: usize, found: usize },

    /// Every row was removed
    #[error("All the data are invalid")]
    EmptyMatrix,

    /// Row position beyond the row count
    #[error("Row {index} does not exist (row count: {rows})")]
    RowOutOfBounds { index: usize, rows: usize },

    /// Single-column access on a composite column, or the reverse
    #[error("Column '{name}' has {width} physical columns")]
    ColumnShape { name: String, width: usize },

    /// Header key not present
    #[error("'{key}' is not a valid header key. Valid keys are: {valid:?}")]
    InvalidHeaderKey { key: String, valid: Vec<String> },

    /// Header value present but of another type
    #[error("Header '{key}' is not of type {expected}")]
    HeaderType { key: String, expected: &'static str },

    /// Attribute name not present
    #[error("Invalid attribute name '{name}'. Valid attribute name are: {valid:?}")]
    InvalidAttribute { name: String, valid: Vec<String> },

    /// Attribute name already used
    #[error("Attribute name '{0}' already used")]
    DuplicateAttribute(String),

    /// Attribute present but holding another kind of value
    #[error("Attribute '{name}' is not of type {expected}")]
    AttributeType { name: String, expected: &'static str },

    /// Road layer type name not recognised
    #[error("'{found}' is not a valid road layer type. Valid type are {valid:?}. Check the station configuration file")]
    InvalidLayerType { found: String, valid: Vec<&'static str> },

    /// Cell text that cannot be read for its declared field kind
    #[error("Cannot parse '{value}' as {kind} for field '{field}'")]
    FieldParse {
        field: String,
        kind: &'static str,
        value: String,
    },
}

/// Type alias for Results using DataError
pub type Result<T> = std::result::Result<T, DataError>;
