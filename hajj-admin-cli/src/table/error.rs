use crate::api::ApiError;

/// Failure of a resource table operation
#[derive(Debug, Clone, PartialEq)]
pub enum TableError {
    /// A server call failed (including a missing credential)
    Api(ApiError),
    /// The id is not among the loaded records
    NotFoundLocally(String),
    /// Another record is already in edit mode
    AlreadyEditing { current: String },
    /// The operation needs the record to be in edit mode
    NotEditing(String),
    UnknownField(String),
    /// A typed-in value does not fit the field
    InvalidValue { field: String, message: String },
    /// The entity does not support the operation
    Unsupported(&'static str),
    NothingSelected,
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::Api(err) => write!(f, "{}", err),
            TableError::NotFoundLocally(id) => write!(f, "No loaded record with id '{}'", id),
            TableError::AlreadyEditing { current } => write!(
                f,
                "Record '{}' is already being edited; save or cancel it first",
                current
            ),
            TableError::NotEditing(id) => write!(f, "Record '{}' is not being edited", id),
            TableError::UnknownField(field) => write!(f, "Unknown field '{}'", field),
            TableError::InvalidValue { field, message } => {
                write!(f, "Invalid value for '{}': {}", field, message)
            }
            TableError::Unsupported(op) => write!(f, "This entity does not support {}", op),
            TableError::NothingSelected => write!(f, "No records selected"),
        }
    }
}

impl std::error::Error for TableError {}

impl From<ApiError> for TableError {
    fn from(err: ApiError) -> Self {
        TableError::Api(err)
    }
}
