use std::collections::BTreeSet;

use foundation::points::{Category, CategoryKind, GeoPoint};

/// Set of categories shown on the map. Starts with everything active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFilter {
    active: BTreeSet<Category>,
}

impl Default for CategoryFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl CategoryFilter {
    pub fn all() -> Self {
        Self {
            active: Category::ALL.iter().copied().collect(),
        }
    }

    pub fn none() -> Self {
        Self {
            active: BTreeSet::new(),
        }
    }

    pub fn only_kind(kind: CategoryKind) -> Self {
        Self {
            active: Category::ALL.iter().copied().filter(|c| c.kind() == kind).collect(),
        }
    }

    pub fn is_active(&self, category: Category) -> bool {
        self.active.contains(&category)
    }

    pub fn is_all(&self) -> bool {
        self.active.len() == Category::ALL.len()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn set(&mut self, category: Category, active: bool) {
        if active {
            self.active.insert(category);
        } else {
            self.active.remove(&category);
        }
    }

    /// Returns the new state of `category`.
    pub fn toggle(&mut self, category: Category) -> bool {
        let now = !self.is_active(category);
        self.set(category, now);
        now
    }

    /// Points in active categories, in input order.
    pub fn apply(&self, points: &[GeoPoint]) -> Vec<GeoPoint> {
        if self.is_all() {
            return points.to_vec();
        }
        points
            .iter()
            .filter(|p| self.is_active(p.category))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use foundation::math::Coordinate;
    use foundation::points::{Category, CategoryKind, GeoPoint};

    use super::CategoryFilter;

    fn points() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new("a", Coordinate::new(56.0, 10.0), Category::Chanterelle),
            GeoPoint::new("b", Coordinate::new(56.1, 10.1), Category::Blueberry),
            GeoPoint::new("c", Coordinate::new(56.2, 10.2), Category::Other),
        ]
    }

    #[test]
    fn default_passes_everything() {
        let f = CategoryFilter::default();
        assert!(f.is_all());
        assert_eq!(f.apply(&points()).len(), 3);
    }

    #[test]
    fn toggled_category_is_dropped() {
        let mut f = CategoryFilter::default();
        assert!(!f.toggle(Category::Blueberry));
        let kept = f.apply(&points());
        let ids: Vec<&str> = kept.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(f.toggle(Category::Blueberry));
        assert!(f.is_all());
    }

    #[test]
    fn kind_filter() {
        let f = CategoryFilter::only_kind(CategoryKind::Mushroom);
        let kept = f.apply(&points());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].category, Category::Chanterelle);
        assert!(CategoryFilter::none().apply(&points()).is_empty());
    }
}
