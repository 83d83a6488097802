use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;

#[derive(Debug)]
pub enum AppError {
    /// Bad or missing request fields
    InvalidInput(String),
    /// A non-terminal session already exists for the identifier
    AlreadyActive(String),
    NotFound(String),
    /// The encoder could not be launched
    SpawnError(String),
    /// The output directory could not be provisioned
    StorageError(String),
    InternalServerError(anyhow::Error),
}

impl AppError {
    pub fn invalid_input<T>(t: T) -> Self
    where
        T: ToString,
    {
        AppError::InvalidInput(t.to_string())
    }

    pub fn already_active<T>(t: T) -> Self
    where
        T: ToString,
    {
        AppError::AlreadyActive(t.to_string())
    }

    pub fn not_found<T>(t: T) -> Self
    where
        T: ToString,
    {
        AppError::NotFound(t.to_string())
    }

    pub fn spawn_error<T>(t: T) -> Self
    where
        T: ToString,
    {
        AppError::SpawnError(t.to_string())
    }

    pub fn storage_error<T>(t: T) -> Self
    where
        T: ToString,
    {
        AppError::StorageError(t.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::AlreadyActive(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::SpawnError(_) => StatusCode::BAD_GATEWAY,
            AppError::StorageError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::InvalidInput(err) => write!(f, "invalid input: {err}"),
            AppError::AlreadyActive(err) => write!(f, "already active: {err}"),
            AppError::NotFound(err) => write!(f, "not found: {err}"),
            AppError::SpawnError(err) => write!(f, "spawn error: {err}"),
            AppError::StorageError(err) => write!(f, "storage error: {err}"),
            AppError::InternalServerError(err) => write!(f, "{err}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error = match &self {
            AppError::InternalServerError(err) => err.to_string(),
            AppError::InvalidInput(err)
            | AppError::AlreadyActive(err)
            | AppError::NotFound(err)
            | AppError::SpawnError(err)
            | AppError::StorageError(err) => err.clone(),
        };
        (self.status(), Json(api::response::Error { error })).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        AppError::InternalServerError(err.into())
    }
}
