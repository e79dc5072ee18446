use thiserror::Error;

#[derive(Error, Debug)]
pub enum OroshiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Could not read spreadsheet: {0}")]
    Load(String),

    #[error("Required columns are missing: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Invalid keyword pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("Select at least one customer.")]
    EmptySelection,

    #[error("No rows left after filtering. Review the filter conditions.")]
    EmptyFilterResult,

    #[error("Enter a file name for the export (no directories).")]
    InvalidFilename,

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

impl OroshiError {
    /// Recoverable conditions the user fixes by changing inputs.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Self::EmptySelection | Self::EmptyFilterResult | Self::InvalidFilename | Self::Pattern { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, OroshiError>;
