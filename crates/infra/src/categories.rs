//! Category directory: thin CRUD glue plus first-run seeding.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use tracing::info;

use stockpile_catalog::Category;
use stockpile_core::CategoryId;

/// In-memory category directory.
///
/// Categories are simple reference data; products denormalize the category
/// name, so this directory never sits on a hot path.
#[derive(Debug, Default)]
pub struct CategoryDirectory {
    inner: RwLock<HashMap<CategoryId, Category>>,
}

impl CategoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &CategoryId) -> Option<Category> {
        self.inner.read().ok()?.get(id).cloned()
    }

    pub fn upsert(&self, category: Category) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(category.id, category);
        }
    }

    pub fn exists_by_name(&self, name: &str) -> bool {
        self.inner
            .read()
            .map(|m| m.values().any(|c| c.name.eq_ignore_ascii_case(name)))
            .unwrap_or(false)
    }

    /// Active categories ordered by display order, then name.
    pub fn list_active(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = match self.inner.read() {
            Ok(m) => m.values().filter(|c| c.active).cloned().collect(),
            Err(_) => return vec![],
        };
        categories.sort_by(|a, b| {
            a.display_order
                .cmp(&b.display_order)
                .then_with(|| a.name.cmp(&b.name))
        });
        categories
    }

    /// Active root categories.
    pub fn roots(&self) -> Vec<Category> {
        self.list_active().into_iter().filter(|c| c.is_root()).collect()
    }

    /// Active subcategories of one parent.
    pub fn children(&self, parent_id: CategoryId) -> Vec<Category> {
        self.list_active()
            .into_iter()
            .filter(|c| c.parent_id == Some(parent_id))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Install the default category tree on first run (no-op otherwise).
    pub fn seed_defaults(&self) {
        if self.count() > 0 {
            return;
        }
        info!("seeding default categories");

        let now = Utc::now();
        let mut order = 0;
        for (root_name, root_description, subs) in [
            (
                "Electronics",
                "Electronic devices and gadgets",
                vec![
                    ("Smartphones", "Mobile phones and accessories"),
                    ("Laptops", "Laptops and notebooks"),
                    ("Audio", "Headphones and speakers"),
                ],
            ),
            (
                "Home & Kitchen",
                "Household goods and appliances",
                vec![("Appliances", "Kitchen appliances"), ("Furniture", "Home furniture")],
            ),
            (
                "Sports",
                "Sporting goods and outdoor gear",
                vec![("Fitness", "Fitness equipment"), ("Outdoor", "Camping and hiking")],
            ),
        ] {
            order += 1;
            let root = match Category::new(CategoryId::new(), root_name, root_description, now) {
                Ok(c) => c.with_display_order(order),
                Err(_) => continue,
            };
            let root_id = root.id;
            self.upsert(root);

            for (i, (name, description)) in subs.into_iter().enumerate() {
                if let Ok(sub) = Category::new(CategoryId::new(), name, description, now) {
                    self.upsert(sub.with_parent(root_id).with_display_order(i as i32 + 1));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeding_is_idempotent() {
        let directory = CategoryDirectory::new();
        directory.seed_defaults();
        let first_count = directory.count();
        assert!(first_count > 0);

        directory.seed_defaults();
        assert_eq!(directory.count(), first_count);
    }

    #[test]
    fn roots_and_children_partition_the_tree() {
        let directory = CategoryDirectory::new();
        directory.seed_defaults();

        let roots = directory.roots();
        assert!(!roots.is_empty());
        for root in &roots {
            for child in directory.children(root.id) {
                assert_eq!(child.parent_id, Some(root.id));
            }
        }
    }

    #[test]
    fn inactive_categories_disappear_from_listings() {
        let directory = CategoryDirectory::new();
        let mut category =
            Category::new(CategoryId::new(), "Seasonal", "", Utc::now()).unwrap();
        let id = category.id;
        directory.upsert(category.clone());
        assert_eq!(directory.list_active().len(), 1);

        category.active = false;
        directory.upsert(category);
        assert!(directory.list_active().is_empty());
        // Still retrievable directly (soft delete).
        assert!(directory.get(&id).is_some());
    }

    #[test]
    fn name_existence_check_is_case_insensitive() {
        let directory = CategoryDirectory::new();
        directory.upsert(Category::new(CategoryId::new(), "Books", "", Utc::now()).unwrap());
        assert!(directory.exists_by_name("books"));
        assert!(!directory.exists_by_name("Music"));
    }
}
