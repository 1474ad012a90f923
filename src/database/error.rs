use serde::Serialize;
use thiserror::Error;
use warp::http::StatusCode;

/// Every failure a request can end with. All of them are terminal for the request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Permission(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl Error {
    pub fn validation(info: &str) -> Self {
        Self::Validation(info.to_string())
    }

    pub fn not_found(info: &str) -> Self {
        Self::NotFound(info.to_string())
    }

    pub fn permission(info: &str) -> Self {
        Self::Permission(info.to_string())
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized(String::from(
            "Authentication credentials were not provided",
        ))
    }

    pub fn code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Permission(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let detail = match self {
            // internals are logged, not leaked
            Error::Internal(_) => String::from("Internal server error"),
            other => other.to_string(),
        };

        ErrorBody { detail }
    }
}

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub detail: String,
}

impl warp::reject::Reject for Error {}

/// Classifies a `sqlx::Error` before it becomes an [`Error`].
///
/// Constraint violations are the storage layer's last line of defence for the
/// uniqueness rules, so they surface as validation failures rather than 500s.
#[derive(Debug)]
pub enum QueryError {
    UniqueViolation(String),
    ForeignKeyViolation(String),
    CheckViolation(String),
    RowNotFound,
    Other(String),
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Database(e) if e.is_unique_violation() => {
                Self::UniqueViolation(format!("{e}"))
            }
            sqlx::Error::Database(e) if e.is_foreign_key_violation() => {
                Self::ForeignKeyViolation(format!("{e}"))
            }
            sqlx::Error::Database(e) if e.is_check_violation() => {
                Self::CheckViolation(format!("{e}"))
            }
            sqlx::Error::RowNotFound => Self::RowNotFound,
            sqlx::Error::Database(e) => Self::Other(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::Other(String::from("Pool timed out")),
            sqlx::Error::PoolClosed => Self::Other(String::from("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::Other(String::from("Worker crashed")),
            sqlx::Error::ColumnNotFound(e) => Self::Other(format!("Column not found: {e}")),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::Other(format!("Column decode {index} ({source})"))
            }
            other => Self::Other(format!("{other}")),
        }
    }
}

impl From<QueryError> for Error {
    fn from(value: QueryError) -> Self {
        match value {
            QueryError::UniqueViolation(info) => {
                log::warn!("Unique constraint rejected a write: {info}");
                Error::validation("Object with these fields already exists")
            }
            QueryError::ForeignKeyViolation(info) => {
                log::warn!("Foreign key constraint rejected a write: {info}");
                Error::validation("Referenced object does not exist")
            }
            QueryError::CheckViolation(info) => {
                log::warn!("Check constraint rejected a write: {info}");
                Error::validation("Value is out of the allowed range")
            }
            QueryError::RowNotFound => Error::not_found("Not found"),
            QueryError::Other(info) => {
                log::error!("Database query failed: {info}");
                Error::Internal(info)
            }
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(value: sqlx::Error) -> Self {
        QueryError::from(value).into()
    }
}
