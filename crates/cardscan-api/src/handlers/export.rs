use axum::{http::header, response::IntoResponse};
use cardscan_core::ContactRecord;
use cardscan_services::{export_csv, EXPORT_FILENAME};

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};

/// Export contacts as CSV
///
/// Columns are Name, Designation, Company, Phone, Email, Address, Website, in
/// that order. The raw OCR text is not exported.
#[utoipa::path(
    post,
    path = "/export",
    tag = "cards",
    request_body = Vec<ContactRecord>,
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv", body = String),
        (status = 400, description = "No records received", body = ErrorResponse)
    )
)]
pub async fn export_contacts(
    ValidatedJson(records): ValidatedJson<Vec<ContactRecord>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let csv = export_csv(&records)?;
    tracing::info!(rows = records.len(), "Exporting contacts");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILENAME),
            ),
        ],
        csv,
    ))
}
