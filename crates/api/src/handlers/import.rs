//! Handler for bulk CSV import.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use catalog_core::error::CoreError;
use catalog_core::import::ImportError;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Multipart field carrying the uploaded document.
pub const CSV_FIELD: &str = "csv_file";

fn invalid_csv() -> AppError {
    AppError::BadRequest("Not a valid csv file".into())
}

/// POST /resources/csv_import/
///
/// 204 when every row was imported, 207 with `{"resources_failed": [...]}`
/// when some were rejected.
pub async fn csv_import(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Response> {
    let multipart = multipart.map_err(|err| {
        tracing::debug!(error = %err, "Import request is not multipart");
        invalid_csv()
    })?;
    let content = read_csv_field(multipart).await?;

    let report = state.importer.import_csv(&content).await.map_err(|err| match err {
        ImportError::Csv(err) => {
            tracing::debug!(error = %err, "Unreadable import document");
            invalid_csv()
        }
        ImportError::Store(err) => AppError::Core(CoreError::Store(err)),
    })?;

    if report.all_succeeded() {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Ok((StatusCode::MULTI_STATUS, Json(report)).into_response())
    }
}

/// Find the uploaded file in the form and decode it as UTF-8.
async fn read_csv_field(mut multipart: Multipart) -> AppResult<String> {
    while let Some(field) = multipart.next_field().await.map_err(|_| invalid_csv())? {
        if field.name() != Some(CSV_FIELD) {
            continue;
        }
        if field.file_name().is_none() {
            return Err(invalid_csv());
        }
        let bytes = field.bytes().await.map_err(|_| invalid_csv())?;
        return String::from_utf8(bytes.to_vec()).map_err(|_| invalid_csv());
    }
    Err(invalid_csv())
}
