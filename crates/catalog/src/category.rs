use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockpile_core::{CategoryId, DomainError};

/// A catalog category. Categories form a two-level hierarchy: roots have no
/// `parent_id`, subcategories point at a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub parent_id: Option<CategoryId>,
    /// Position within its sibling group on listing surfaces.
    pub display_order: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(
        id: CategoryId,
        name: impl Into<String>,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("category name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            description: description.into(),
            parent_id: None,
            display_order: 0,
            active: true,
            created_at: now,
        })
    }

    pub fn with_parent(mut self, parent_id: CategoryId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_display_order(mut self, display_order: i32) -> Self {
        self.display_order = display_order;
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_is_rejected() {
        let err = Category::new(CategoryId::new(), "  ", "", Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn subcategory_points_at_its_root() {
        let root = Category::new(CategoryId::new(), "Electronics", "", Utc::now()).unwrap();
        let sub = Category::new(CategoryId::new(), "Laptops", "", Utc::now())
            .unwrap()
            .with_parent(root.id);
        assert!(root.is_root());
        assert!(!sub.is_root());
        assert_eq!(sub.parent_id, Some(root.id));
    }
}
