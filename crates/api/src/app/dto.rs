//! Request/response DTOs and JSON mapping helpers.

use serde::Deserialize;
use serde_json::json;

use stockpile_catalog::{Category, Product, ProductDraft};
use stockpile_core::{CategoryId, DomainError, Page, PageRequest, SortBy, SortDirection};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub brand: String,
    pub category_id: CategoryId,
    #[serde(default)]
    pub category_name: String,
    pub price_cents: u64,
    pub stock_quantity: u32,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl From<ProductRequest> for ProductDraft {
    fn from(value: ProductRequest) -> Self {
        ProductDraft {
            name: value.name,
            description: value.description,
            brand: value.brand,
            category_id: value.category_id,
            category_name: value.category_name,
            price_cents: value.price_cents,
            stock_quantity: value.stock_quantity,
            image_url: value.image_url,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    #[serde(default)]
    pub display_order: i32,
}

/// Common listing query parameters. Prices are in the smallest currency
/// unit, matching the stored representation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingParams {
    pub keyword: Option<String>,
    pub user_id: Option<i64>,
    pub category_id: Option<CategoryId>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub threshold: Option<u32>,
    #[serde(default)]
    pub page: u32,
    pub size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

impl ListingParams {
    /// Build a `PageRequest`, with a listing-specific default page size.
    pub fn page_request(&self, default_size: u32) -> PageRequest {
        let sort_by = self
            .sort_by
            .as_deref()
            .map(SortBy::from_param)
            .unwrap_or(SortBy::CreatedAt);
        let direction = self
            .sort_dir
            .as_deref()
            .map(SortDirection::from_param)
            .unwrap_or(SortDirection::Desc);
        PageRequest::new(self.page, self.size.unwrap_or(default_size)).sorted(sort_by, direction)
    }
}

#[derive(Debug, Deserialize)]
pub struct StockParams {
    pub quantity: u32,
}

// -------------------------
// JSON mapping helpers
// -------------------------

/// Paginated response envelope shared by every listing endpoint.
pub fn page_response(page: &Page<Product>) -> serde_json::Value {
    json!({
        "products": page.items,
        "currentPage": page.page,
        "totalItems": page.total_items,
        "totalPages": page.total_pages(),
        "hasNext": page.has_next(),
        "hasPrevious": page.has_previous(),
    })
}

pub fn category_to_json(category: &Category) -> serde_json::Value {
    json!(category)
}

pub fn to_draft_with_fallback_category_name(
    request: ProductRequest,
    lookup: impl Fn(&CategoryId) -> Option<String>,
) -> Result<ProductDraft, DomainError> {
    let mut draft = ProductDraft::from(request);
    if draft.category_name.trim().is_empty() {
        draft.category_name = lookup(&draft.category_id)
            .ok_or_else(|| DomainError::validation("unknown categoryId"))?;
    }
    Ok(draft)
}
