use std::collections::BTreeMap;

use crate::coco::{Category, CategoryId};

/// Immutable COCO category id → YOLO class index table.
///
/// Indices are dense, zero-based and assigned in ascending category id
/// order, so the same category list always yields the same table no matter
/// how the document orders it. Built once per run and shared by reference.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CategoryMap {
    index_of: BTreeMap<CategoryId, usize>,
    names: Vec<String>,
}

impl CategoryMap {
    /// Builds the table. A repeated category id keeps its first name.
    pub fn from_categories(categories: &[Category]) -> Self {
        let mut by_id: BTreeMap<CategoryId, &str> = BTreeMap::new();
        for category in categories {
            by_id.entry(category.id).or_insert(category.name.as_str());
        }

        let mut index_of = BTreeMap::new();
        let mut names = Vec::with_capacity(by_id.len());
        for (class_index, (id, name)) in by_id.into_iter().enumerate() {
            index_of.insert(id, class_index);
            names.push(name.to_string());
        }

        Self { index_of, names }
    }

    pub fn class_index(&self, id: CategoryId) -> Option<usize> {
        self.index_of.get(&id).copied()
    }

    /// Category names in class-index order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_ascending_category_id() {
        let categories = vec![
            Category::new(7u64, "seven"),
            Category::new(3u64, "three"),
            Category::new(9u64, "nine"),
        ];
        let map = CategoryMap::from_categories(&categories);

        assert_eq!(map.class_index(CategoryId(3)), Some(0));
        assert_eq!(map.class_index(CategoryId(7)), Some(1));
        assert_eq!(map.class_index(CategoryId(9)), Some(2));
        assert_eq!(map.class_index(CategoryId(1)), None);
        assert_eq!(map.names(), ["three", "seven", "nine"]);
    }

    #[test]
    fn input_order_does_not_matter() {
        let a = CategoryMap::from_categories(&[
            Category::new(9u64, "nine"),
            Category::new(3u64, "three"),
            Category::new(7u64, "seven"),
        ]);
        let b = CategoryMap::from_categories(&[
            Category::new(3u64, "three"),
            Category::new(7u64, "seven"),
            Category::new(9u64, "nine"),
        ]);
        assert_eq!(a, b);
    }

    #[test]
    fn duplicate_ids_collapse_to_first_name() {
        let map = CategoryMap::from_categories(&[
            Category::new(1u64, "first"),
            Category::new(1u64, "second"),
        ]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.names(), ["first"]);
    }

    #[test]
    fn zero_based_ids_are_fine() {
        let map = CategoryMap::from_categories(&[
            Category::new(1u64, "b"),
            Category::new(0u64, "a"),
        ]);
        assert_eq!(map.class_index(CategoryId(0)), Some(0));
        assert_eq!(map.class_index(CategoryId(1)), Some(1));
        assert!(!map.is_empty());
    }
}
