use crate::schema::ReferenceKind;

/// Why a spreadsheet was not imported
#[derive(Debug, Clone, PartialEq)]
pub enum ImportError {
    /// The entity has no bulk-upload endpoint
    NotSupported(&'static str),
    WrongExtension,
    EmptyFile,
    /// calamine could not read the workbook
    Unreadable(String),
    MissingHeaders { required: Vec<String> },
    MissingRequiredField {
        row: u32,
        field: String,
        required: Vec<String>,
    },
    InvalidEnumValue {
        row: u32,
        field: String,
        value: String,
        allowed: Vec<String>,
    },
    InvalidReference {
        row: u32,
        kind: ReferenceKind,
        value: String,
    },
    InvalidCoordinate {
        row: u32,
        field: String,
        value: String,
    },
    MissingCredential,
    ServerRejected(String),
}

impl ImportError {
    /// Spreadsheet row the problem was found on, if any
    pub fn row(&self) -> Option<u32> {
        match self {
            ImportError::MissingRequiredField { row, .. }
            | ImportError::InvalidEnumValue { row, .. }
            | ImportError::InvalidReference { row, .. }
            | ImportError::InvalidCoordinate { row, .. } => Some(*row),
            _ => None,
        }
    }
}

/// "a", "a and b", "a, b, and c"
pub(crate) fn join_with_and(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{} and {}", a, b),
        [rest @ .., last] => format!("{}, and {}", rest.join(", "), last),
    }
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::NotSupported(plural) => {
                write!(f, "Bulk upload is not available for {}", plural)
            }
            ImportError::WrongExtension => write!(f, "Please upload an Excel file (.xlsx or .xls)"),
            ImportError::EmptyFile => write!(f, "The Excel file is empty. Please add some data."),
            ImportError::Unreadable(_) => write!(f, "Error processing file. Please try again."),
            ImportError::MissingHeaders { required } => write!(
                f,
                "Excel file must have required columns: {}",
                join_with_and(required)
            ),
            ImportError::MissingRequiredField { row, required, .. } => write!(
                f,
                "Row {}: Missing required data. Each row must have {}.",
                row,
                join_with_and(required)
            ),
            ImportError::InvalidEnumValue {
                row,
                field,
                value,
                allowed,
            } => write!(
                f,
                "Row {}: Invalid {}: {}. Must be one of: {}",
                row,
                field,
                value,
                allowed.join(", ")
            ),
            ImportError::InvalidReference { row, kind, value } => write!(
                f,
                "Row {}: Invalid {} name \"{}\". Please use a valid {} name.",
                row, kind, value, kind
            ),
            ImportError::InvalidCoordinate { row, field, value } => {
                let range = if field == "latitude" { "-90 and 90" } else { "-180 and 180" };
                write!(
                    f,
                    "Row {}: Invalid {} \"{}\". Must be a number between {}.",
                    row, field, value, range
                )
            }
            ImportError::MissingCredential => {
                write!(f, "Authentication token not found. Please log in again.")
            }
            ImportError::ServerRejected(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ImportError {}
