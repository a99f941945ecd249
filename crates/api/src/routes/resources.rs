//! Route definitions for the `/resources` collection.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{import, resources};
use crate::state::AppState;

/// Routes for the resource collection. Paths keep their trailing slash.
///
/// ```text
/// GET    /resources/               -> list
/// POST   /resources/               -> create
/// GET    /resources/list/          -> list_page (HTML)
/// POST   /resources/csv_import/    -> csv_import
/// GET    /resources/{id}/          -> retrieve
/// PUT    /resources/{id}/          -> update
/// PATCH  /resources/{id}/          -> patch
/// DELETE /resources/{id}/          -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/resources/", get(resources::list).post(resources::create))
        .route("/resources/list/", get(resources::list_page))
        .route("/resources/csv_import/", post(import::csv_import))
        .route(
            "/resources/{id}/",
            get(resources::retrieve)
                .put(resources::update)
                .patch(resources::patch)
                .delete(resources::delete),
        )
}
