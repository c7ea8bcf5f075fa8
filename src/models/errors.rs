use axum::http::StatusCode;
use thiserror::Error;

/// Service-level errors that can occur in business logic
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    ValidationError { message: String },

    /// Name already taken. Reported to clients as an insertion failure.
    #[error("{name} already exists in the database")]
    DuplicateCuisine { name: String },

    #[error("{source}")]
    Repository {
        #[from]
        source: RepositoryError,
    },
}

/// Repository-level errors for data access operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database connection failed")]
    ConnectionFailed,

    #[error("AWS SDK error: {message}")]
    AwsSdk { message: String },

    #[error("DynamoDB table not found: {table_name}. Ensure the table exists and IAM permissions are correct.")]
    TableNotFound { table_name: String },

    #[error("Invalid item: {message}")]
    InvalidItem { message: String },

    #[error("{count} items were left unprocessed by batch write to {table_name}")]
    UnprocessedItems { table_name: String, count: usize },

    #[error("Timeout occurred during operation")]
    Timeout,
}

/// Validation errors for input data
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredField { field: String },

    #[error("Field too long: {field}, max_length={max_length}, actual_length={actual_length}")]
    TooLong {
        field: String,
        max_length: usize,
        actual_length: usize,
    },
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        let message = match err {
            ValidationError::RequiredField { .. } => {
                "missing params for database insert".to_string()
            }
            other => other.to_string(),
        };
        ServiceError::ValidationError { message }
    }
}

/// Which operation an error surfaced from, used when shaping the envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert,
    FindAll,
}

impl ServiceError {
    /// Root cause label and HTTP status reported in the response envelope
    pub fn root_cause_status(&self, operation: Operation) -> (&'static str, StatusCode) {
        match self {
            ServiceError::ValidationError { .. } => ("Validation error", StatusCode::BAD_REQUEST),
            ServiceError::DuplicateCuisine { .. } | ServiceError::Repository { .. } => {
                match operation {
                    Operation::Insert => ("Insertion error", StatusCode::INTERNAL_SERVER_ERROR),
                    Operation::FindAll => ("FindAll error", StatusCode::INTERNAL_SERVER_ERROR),
                }
            }
        }
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Result type alias for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;
