//! Handlers for the `/resources` collection.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::Json;
use catalog_core::resource::Resource;
use catalog_core::search::ListQuery;
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Parse a request body as a JSON object.
fn parse_object(body: &[u8]) -> AppResult<Map<String, Value>> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(AppError::BadRequest("Invalid payload".into())),
    }
}

/// POST /resources/
pub async fn create(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Resource>)> {
    let payload = parse_object(&body)?;
    let resource = state.resources.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(resource)))
}

/// GET /resources/
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<Vec<Resource>>> {
    let query = ListQuery::from_params(&params);
    let resources = state.resources.list(&query).await?;
    Ok(Json(resources))
}

/// GET /resources/{id}/
pub async fn retrieve(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Resource>> {
    let resource = state.resources.retrieve(&id).await?;
    Ok(Json(resource))
}

/// PUT /resources/{id}/
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> AppResult<Json<Resource>> {
    let payload = payload_for(&state, &id, &body).await?;
    let resource = state.resources.update(&id, &payload).await?;
    Ok(Json(resource))
}

/// PATCH /resources/{id}/
pub async fn patch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> AppResult<Json<Resource>> {
    let payload = payload_for(&state, &id, &body).await?;
    let resource = state.resources.patch(&id, &payload).await?;
    Ok(Json(resource))
}

/// DELETE /resources/{id}/
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.resources.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /resources/list/
pub async fn list_page(State(state): State<AppState>) -> AppResult<Html<String>> {
    let resources = state.resources.list_all().await?;
    Ok(Html(render_page(&resources)))
}

/// Parse the body of an edit request. An unknown id answers 404 even when
/// the body is unreadable.
async fn payload_for(state: &AppState, id: &str, body: &[u8]) -> AppResult<Map<String, Value>> {
    match parse_object(body) {
        Ok(payload) => Ok(payload),
        Err(err) => {
            state.resources.retrieve(id).await?;
            Err(err)
        }
    }
}

const PAGE_COLUMNS: [&str; 11] = [
    "id",
    "sku",
    "seller",
    "campaign_code",
    "product_name",
    "brand",
    "category",
    "subcategory",
    "size",
    "list_price",
    "price",
];

fn render_page(resources: &[Resource]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Resources</title></head>\n<body>\n<h1>Resources</h1>\n",
    );

    if resources.is_empty() {
        html.push_str("<p>There are no resources to display</p>\n");
    } else {
        html.push_str("<table>\n<tr>");
        for column in PAGE_COLUMNS {
            html.push_str(&format!("<th>{column}</th>"));
        }
        html.push_str("</tr>\n");

        for resource in resources {
            let cells = [
                resource.id.clone(),
                resource.sku.clone(),
                resource.seller.clone(),
                resource.campaign_code.clone(),
                resource.product_name.clone(),
                resource.brand.clone(),
                resource.category.clone(),
                resource.subcategory.clone(),
                resource.size.clone(),
                resource.list_price.to_string(),
                resource.price.to_string(),
            ];
            html.push_str("<tr>");
            for cell in &cells {
                html.push_str(&format!("<td>{}</td>", escape_html(cell)));
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</table>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
