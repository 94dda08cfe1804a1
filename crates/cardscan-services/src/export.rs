//! CSV export of processed contact records.

use cardscan_core::models::EXPORT_COLUMNS;
use cardscan_core::ContactRecord;

/// Download name for the exported file.
pub const EXPORT_FILENAME: &str = "CardScan_Export.csv";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No data received for export.")]
    Empty,

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to flush CSV: {0}")]
    Io(#[from] std::io::Error),
}

/// Render records as CSV: one header row, then one row per record in input order.
///
/// `Raw_Text` is not exported.
pub fn export_csv(records: &[ContactRecord]) -> Result<Vec<u8>, ExportError> {
    if records.is_empty() {
        return Err(ExportError::Empty);
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_COLUMNS)?;
    for record in records {
        writer.write_record(
            EXPORT_COLUMNS
                .iter()
                .map(|column| record.field(column).unwrap_or_default()),
        )?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    tracing::debug!(rows = records.len(), bytes = bytes.len(), "Exported contacts to CSV");
    Ok(bytes)
}
