//! Search and product-view analytics emission.

use std::sync::Arc;

use chrono::Utc;

use stockpile_core::ProductId;
use stockpile_events::{keys, ProductViewed, SearchPerformed, Topic};

use crate::publisher::EventPublisher;

/// Tracks read-side behavior for downstream analytics consumers.
///
/// Emission rides on [`EventPublisher`], so a bus outage costs analytics
/// data, never a request.
pub struct SearchAnalytics {
    publisher: Arc<EventPublisher>,
}

impl SearchAnalytics {
    pub fn new(publisher: Arc<EventPublisher>) -> Self {
        Self { publisher }
    }

    pub fn track_search(&self, keyword: &str, user_id: Option<i64>, results_count: u64) {
        self.publisher.emit(
            Topic::SearchEvents,
            keys::SEARCH_PERFORMED,
            &SearchPerformed {
                keyword: keyword.to_string(),
                user_id,
                results_count,
                timestamp: Utc::now(),
            },
        );
    }

    pub fn track_product_view(&self, product_id: ProductId, user_id: Option<i64>) {
        self.publisher.emit(
            Topic::ProductEvents,
            keys::PRODUCT_VIEWED,
            &ProductViewed {
                product_id,
                user_id,
                timestamp: Utc::now(),
            },
        );
    }
}
