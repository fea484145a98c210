//! Postgres-backed record store (optional).
//!
//! Bridges the sync [`RecordStore`] trait onto sqlx from inside a tokio
//! runtime via `block_in_place`, so handlers can call it directly.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE products (
//!     id             UUID PRIMARY KEY,
//!     name           TEXT NOT NULL,
//!     description    TEXT NOT NULL,
//!     brand          TEXT NOT NULL,
//!     category_id    UUID NOT NULL,
//!     category_name  TEXT NOT NULL,
//!     price_cents    BIGINT NOT NULL CHECK (price_cents >= 0),
//!     stock_quantity BIGINT NOT NULL CHECK (stock_quantity >= 0),
//!     image_url      TEXT,
//!     active         BOOLEAN NOT NULL,
//!     created_at     TIMESTAMPTZ NOT NULL,
//!     updated_at     TIMESTAMPTZ NOT NULL
//! );
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::warn;
use uuid::Uuid;

use stockpile_catalog::Product;
use stockpile_core::{Page, PageRequest, ProductId, SortBy, SortDirection};

use super::{RecordStore, RecordStoreError};

const COLUMNS: &str = "id, name, description, brand, category_id, category_name, \
                       price_cents, stock_quantity, image_url, active, created_at, updated_at";

/// Postgres-backed product store.
///
/// Thread-safe via the sqlx connection pool. Must be used from within a
/// multi-threaded tokio runtime (the sync trait methods block in place).
pub struct PostgresRecordStore {
    pool: Arc<PgPool>,
}

impl PostgresRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    fn block_on<T>(&self, fut: impl Future<Output = Result<T, sqlx::Error>>) -> Result<T, RecordStoreError> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| RecordStoreError::Backend(e.to_string()))?;
        tokio::task::block_in_place(|| handle.block_on(fut))
            .map_err(|e| RecordStoreError::Backend(e.to_string()))
    }
}

fn row_to_product(row: &PgRow) -> Result<Product, sqlx::Error> {
    Ok(Product {
        id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        brand: row.try_get("brand")?,
        category_id: row.try_get::<Uuid, _>("category_id")?.into(),
        category_name: row.try_get("category_name")?,
        price_cents: row.try_get::<i64, _>("price_cents")?.max(0) as u64,
        stock_quantity: row.try_get::<i64, _>("stock_quantity")?.clamp(0, u32::MAX as i64) as u32,
        image_url: row.try_get("image_url")?,
        active: row.try_get("active")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

fn order_clause(sort_by: SortBy, direction: SortDirection) -> String {
    let column = match sort_by {
        SortBy::CreatedAt => "created_at",
        SortBy::Price => "price_cents",
        SortBy::Name => "lower(name)",
        SortBy::StockQuantity => "stock_quantity",
    };
    let dir = match direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    };
    format!("ORDER BY {column} {dir}")
}

impl RecordStore for PostgresRecordStore {
    fn get(&self, id: &ProductId) -> Option<Product> {
        let pool = self.pool.clone();
        let id = *id.as_uuid();
        let result = self.block_on(async move {
            sqlx::query(&format!("SELECT {COLUMNS} FROM products WHERE id = $1"))
                .bind(id)
                .fetch_optional(&*pool)
                .await
        });

        match result {
            Ok(Some(row)) => row_to_product(&row)
                .map_err(|e| warn!(error = %e, "failed to decode product row"))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "record store get failed");
                None
            }
        }
    }

    fn get_many(&self, ids: &[ProductId]) -> Vec<Product> {
        let pool = self.pool.clone();
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let result = self.block_on(async move {
            sqlx::query(&format!("SELECT {COLUMNS} FROM products WHERE id = ANY($1)"))
                .bind(&ids)
                .fetch_all(&*pool)
                .await
        });

        match result {
            Ok(rows) => rows.iter().filter_map(|r| row_to_product(r).ok()).collect(),
            Err(e) => {
                warn!(error = %e, "record store get_many failed");
                vec![]
            }
        }
    }

    fn put(&self, product: Product) -> Result<(), RecordStoreError> {
        let pool = self.pool.clone();
        self.block_on(async move {
            sqlx::query(
                "INSERT INTO products (id, name, description, brand, category_id, category_name, \
                 price_cents, stock_quantity, image_url, active, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
                 ON CONFLICT (id) DO UPDATE SET \
                 name = EXCLUDED.name, description = EXCLUDED.description, \
                 brand = EXCLUDED.brand, category_id = EXCLUDED.category_id, \
                 category_name = EXCLUDED.category_name, price_cents = EXCLUDED.price_cents, \
                 stock_quantity = EXCLUDED.stock_quantity, image_url = EXCLUDED.image_url, \
                 active = EXCLUDED.active, updated_at = EXCLUDED.updated_at",
            )
            .bind(*product.id.as_uuid())
            .bind(&product.name)
            .bind(&product.description)
            .bind(&product.brand)
            .bind(*product.category_id.as_uuid())
            .bind(&product.category_name)
            .bind(product.price_cents as i64)
            .bind(product.stock_quantity as i64)
            .bind(&product.image_url)
            .bind(product.active)
            .bind(product.created_at)
            .bind(product.updated_at)
            .execute(&*pool)
            .await
            .map(|_| ())
        })
    }

    fn list_active(&self, page: &PageRequest) -> Page<Product> {
        let pool = self.pool.clone();
        let order = order_clause(page.sort_by, page.direction);
        let limit = page.size as i64;
        let offset = page.offset() as i64;

        let result = self.block_on(async move {
            let rows = sqlx::query(&format!(
                "SELECT {COLUMNS} FROM products WHERE active {order} LIMIT $1 OFFSET $2"
            ))
            .bind(limit)
            .bind(offset)
            .fetch_all(&*pool)
            .await?;

            let total: i64 = sqlx::query("SELECT COUNT(*) AS n FROM products WHERE active")
                .fetch_one(&*pool)
                .await?
                .try_get("n")?;

            Ok((rows, total))
        });

        match result {
            Ok((rows, total)) => Page {
                items: rows.iter().filter_map(|r| row_to_product(r).ok()).collect(),
                page: page.page,
                size: page.size,
                total_items: total.max(0) as u64,
            },
            Err(e) => {
                warn!(error = %e, "record store list_active failed");
                Page::empty(page)
            }
        }
    }

    fn brands(&self) -> Vec<String> {
        let pool = self.pool.clone();
        let result = self.block_on(async move {
            sqlx::query("SELECT DISTINCT brand FROM products WHERE active ORDER BY brand")
                .fetch_all(&*pool)
                .await
        });

        match result {
            Ok(rows) => rows
                .iter()
                .filter_map(|r| r.try_get::<String, _>("brand").ok())
                .collect(),
            Err(e) => {
                warn!(error = %e, "record store brands failed");
                vec![]
            }
        }
    }
}
