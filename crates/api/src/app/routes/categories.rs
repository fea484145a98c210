use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;

use stockpile_catalog::Category;
use stockpile_core::CategoryId;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/hierarchy", get(hierarchy))
        .route("/:id", get(get_category).put(update_category).delete(delete_category))
        .route("/:id/subcategories", get(subcategories))
        .route("/:id/toggle", put(toggle_category))
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let categories: Vec<_> = services
        .categories
        .list_active()
        .iter()
        .map(dto::category_to_json)
        .collect();
    (StatusCode::OK, Json(categories)).into_response()
}

pub async fn hierarchy(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let roots = services.categories.roots();

    let subcategories: serde_json::Map<String, serde_json::Value> = roots
        .iter()
        .map(|root| {
            let children: Vec<_> = services
                .categories
                .children(root.id)
                .iter()
                .map(dto::category_to_json)
                .collect();
            (root.id.to_string(), serde_json::json!(children))
        })
        .collect();

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "categories": roots,
            "subcategories": subcategories,
        })),
    )
        .into_response()
}

pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CategoryId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid category id"),
    };

    match services.categories.get(&id) {
        Some(category) => (StatusCode::OK, Json(category)).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "category not found"),
    }
}

pub async fn subcategories(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CategoryId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid category id"),
    };
    (StatusCode::OK, Json(services.categories.children(id))).into_response()
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CategoryRequest>,
) -> axum::response::Response {
    if services.categories.exists_by_name(&body.name) {
        return errors::json_error(StatusCode::CONFLICT, "conflict", "category name already exists");
    }

    let category = match Category::new(CategoryId::new(), body.name, body.description, Utc::now()) {
        Ok(c) => c,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
    };
    let mut category = category.with_display_order(body.display_order);
    if let Some(parent_id) = body.parent_id {
        if services.categories.get(&parent_id).is_none() {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "unknown parentId");
        }
        category = category.with_parent(parent_id);
    }

    services.categories.upsert(category.clone());
    (StatusCode::CREATED, Json(category)).into_response()
}

pub async fn update_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::CategoryRequest>,
) -> axum::response::Response {
    let id: CategoryId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid category id"),
    };

    let Some(mut category) = services.categories.get(&id) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "category not found");
    };

    if body.name.trim().is_empty() {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "category name cannot be empty");
    }
    category.name = body.name;
    category.description = body.description;
    category.display_order = body.display_order;
    category.parent_id = body.parent_id;

    services.categories.upsert(category.clone());
    (StatusCode::OK, Json(category)).into_response()
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CategoryId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid category id"),
    };

    let Some(mut category) = services.categories.get(&id) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "category not found");
    };

    // Soft delete, mirroring products.
    category.active = false;
    services.categories.upsert(category);

    (
        StatusCode::OK,
        Json(serde_json::json!({"success": true, "message": "Category deleted successfully"})),
    )
        .into_response()
}

pub async fn toggle_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: CategoryId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid category id"),
    };

    let Some(mut category) = services.categories.get(&id) else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "category not found");
    };

    category.active = !category.active;
    let active = category.active;
    services.categories.upsert(category);

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "success": true,
            "message": "Category status updated",
            "active": active,
        })),
    )
        .into_response()
}
