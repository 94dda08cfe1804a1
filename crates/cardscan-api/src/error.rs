//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Stage errors that
//! can reach a handler (`ValidationError`, `ExportError`) convert into
//! `AppError` here so every failure renders the same JSON body.

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use cardscan_core::{AppError, ErrorMetadata, LogLevel};
use cardscan_processing::ValidationError;
use cardscan_services::ExportError;
use serde::{de::DeserializeOwned, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Suggested action for the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from cardscan-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::from(err))
    }
}

/// Convert JSON body deserialization failures into a 400 with our ErrorResponse format.
impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        let body_text = rejection.body_text();
        let message = if body_text.contains("invalid type") {
            "Invalid request body: contact fields must be strings.".to_string()
        } else {
            format!("Invalid request body: {}", body_text)
        };
        HttpAppError(AppError::InvalidInput(message))
    }
}

/// JSON body extractor that returns our ErrorResponse format (400 + JSON) on deserialization failure.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

tokio::task_local! {
    static SHOW_ERROR_DETAILS: bool;
}

/// Middleware that decides, per router, whether error bodies carry details.
/// Outside this scope details are hidden.
pub async fn error_detail_scope(
    State(show_details): State<bool>,
    request: Request,
    next: Next,
) -> Response {
    SHOW_ERROR_DETAILS.scope(show_details, next.run(request)).await
}

fn show_error_details() -> bool {
    SHOW_ERROR_DETAILS.try_with(|show| *show).unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let show_details = show_error_details() && !app_error.is_sensitive();
        let body = ErrorResponse {
            error: app_error.client_message(),
            details: show_details.then(|| app_error.detailed_message()),
            error_type: show_details.then(|| app_error.error_type().to_string()),
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
            suggested_action: app_error.suggested_action().map(String::from),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for HttpAppError {
    fn from(err: ValidationError) -> Self {
        let app = match err {
            ValidationError::FileTooLarge { size, max } => {
                AppError::PayloadTooLarge(format!("{} bytes exceeds max {} bytes", size, max))
            }
            ValidationError::InvalidExtension { extension, allowed } => {
                AppError::UnsupportedFileType {
                    extension,
                    allowed: allowed.join(", "),
                }
            }
            ValidationError::InvalidFilename(msg) => AppError::InvalidInput(msg),
            ValidationError::MissingExtension(filename) => {
                AppError::InvalidInput(format!("Missing file extension (filename: {})", filename))
            }
            ValidationError::EmptyFile => AppError::InvalidInput("File is empty".to_string()),
        };
        HttpAppError(app)
    }
}

impl From<ExportError> for HttpAppError {
    fn from(err: ExportError) -> Self {
        let app = match err {
            ExportError::Empty => AppError::BadRequest(err.to_string()),
            ExportError::Csv(e) => AppError::Internal(format!("CSV error: {}", e)),
            ExportError::Io(e) => AppError::Internal(format!("IO error: {}", e)),
        };
        HttpAppError(app)
    }
}
