use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use stockpile_core::ProductId;
use stockpile_infra::ReserveOutcome;

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product))
        .route("/search", get(search_products))
        .route("/advanced-search", get(advanced_search))
        .route("/brands", get(all_brands))
        .route("/low-stock", get(low_stock))
        .route("/batch", post(products_by_ids))
        .route("/category/:category_id", get(products_by_category))
        .route("/brand/:brand", get(products_by_brand))
        .route("/:id", get(get_product).put(update_product).delete(delete_product))
        .route("/:id/similar", get(similar_products))
        .route("/:id/stock", put(reserve_stock))
        .route("/:id/stock/restore", put(restore_stock))
}

// -------------------------
// Search / read endpoints
// -------------------------

pub async fn search_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::ListingParams>,
) -> axum::response::Response {
    let page_request = params.page_request(12);
    let page = match services.queries.search(params.keyword.as_deref(), &page_request) {
        Ok(p) => p,
        Err(e) => return errors::query_error_to_response(e),
    };

    if let Some(keyword) = params.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        services
            .analytics
            .track_search(keyword, params.user_id, page.total_items);
    }

    let mut response = dto::page_response(&page);
    response["keyword"] = serde_json::json!(params.keyword);
    (StatusCode::OK, Json(response)).into_response()
}

pub async fn advanced_search(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::ListingParams>,
) -> axum::response::Response {
    let page_request = params.page_request(12);
    let page = match services.queries.advanced_search(
        params.keyword.as_deref(),
        params.category_id,
        params.min_price,
        params.max_price,
        &page_request,
    ) {
        Ok(p) => p,
        Err(e) => return errors::query_error_to_response(e),
    };

    let mut response = dto::page_response(&page);
    response["filters"] = serde_json::json!({
        "keyword": params.keyword,
        "categoryId": params.category_id,
        "minPrice": params.min_price,
        "maxPrice": params.max_price,
    });
    (StatusCode::OK, Json(response)).into_response()
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(params): Query<dto::ListingParams>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };

    match services.catalog.get(&id) {
        Some(product) => {
            services.analytics.track_product_view(id, params.user_id);
            (StatusCode::OK, Json(product)).into_response()
        }
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
    }
}

pub async fn products_by_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(category_id): Path<String>,
    Query(params): Query<dto::ListingParams>,
) -> axum::response::Response {
    let category_id = match category_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid category id"),
    };

    match services.queries.by_category(category_id, &params.page_request(12)) {
        Ok(page) => {
            let mut response = dto::page_response(&page);
            response["categoryId"] = serde_json::json!(category_id);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => errors::query_error_to_response(e),
    }
}

pub async fn products_by_brand(
    Extension(services): Extension<Arc<AppServices>>,
    Path(brand): Path<String>,
    Query(params): Query<dto::ListingParams>,
) -> axum::response::Response {
    match services.queries.by_brand(&brand, &params.page_request(12)) {
        Ok(page) => {
            let mut response = dto::page_response(&page);
            response["brand"] = serde_json::json!(brand);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => errors::query_error_to_response(e),
    }
}

pub async fn similar_products(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(params): Query<dto::ListingParams>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };

    match services.queries.similar(id, &params.page_request(6)) {
        Ok(page) => {
            let mut response = dto::page_response(&page);
            response["productId"] = serde_json::json!(id);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => errors::query_error_to_response(e),
    }
}

pub async fn all_brands(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    (StatusCode::OK, Json(services.queries.brands())).into_response()
}

pub async fn low_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::ListingParams>,
) -> axum::response::Response {
    let threshold = params.threshold.unwrap_or(10);
    match services.queries.low_stock(threshold, &params.page_request(20)) {
        Ok(page) => {
            let mut response = dto::page_response(&page);
            response["threshold"] = serde_json::json!(threshold);
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => errors::query_error_to_response(e),
    }
}

pub async fn products_by_ids(
    Extension(services): Extension<Arc<AppServices>>,
    Json(ids): Json<Vec<String>>,
) -> axum::response::Response {
    let mut parsed = Vec::with_capacity(ids.len());
    for id in &ids {
        match id.parse::<ProductId>() {
            Ok(v) => parsed.push(v),
            Err(_) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_id",
                    format!("invalid product id: {id}"),
                )
            }
        }
    }
    (StatusCode::OK, Json(services.catalog.get_many(&parsed))).into_response()
}

// -------------------------
// Admin endpoints
// -------------------------

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ProductRequest>,
) -> axum::response::Response {
    let draft = match dto::to_draft_with_fallback_category_name(body, |id| {
        services.categories.get(id).map(|c| c.name)
    }) {
        Ok(d) => d,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
    };

    match services.catalog.create(draft) {
        Ok(product) => (StatusCode::CREATED, Json(product)).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ProductRequest>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };

    let draft = match dto::to_draft_with_fallback_category_name(body, |category_id| {
        services.categories.get(category_id).map(|c| c.name)
    }) {
        Ok(d) => d,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
    };

    match services.catalog.update(id, draft) {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };

    match services.catalog.delete(id) {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"success": true, "message": "Product deleted successfully"})),
        )
            .into_response(),
        Err(e) => errors::catalog_error_to_response(e),
    }
}

// -------------------------
// Inventory endpoints
// -------------------------

pub async fn reserve_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(params): Query<dto::StockParams>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };

    match services.ledger.reserve(id, params.quantity) {
        Ok(ReserveOutcome::Reserved { remaining }) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "Stock updated successfully",
                "currentStock": remaining,
            })),
        )
            .into_response(),
        Ok(ReserveOutcome::Insufficient { available }) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": false,
                "message": "Insufficient stock",
                "currentStock": available,
            })),
        )
            .into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn restore_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Query(params): Query<dto::StockParams>,
) -> axum::response::Response {
    let id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };

    match services.ledger.restore(id, params.quantity) {
        Ok(current) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "message": "Stock restored successfully",
                "currentStock": current,
            })),
        )
            .into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
