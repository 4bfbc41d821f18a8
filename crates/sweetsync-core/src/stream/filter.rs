// ── Filter predicates for item streams ──
//
// Applied to store snapshots to derive the displayed view without
// re-querying the service.

use serde::{Deserialize, Serialize};

use crate::model::Item;

/// Search criteria. Mirrors the service's `/sweets/search` semantics so the
/// local projection and the server's answer agree: case-insensitive
/// substring on name, exact category, inclusive price bounds. An empty
/// name or category counts as unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
}

impl SearchFilter {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.name().is_none()
            && self.category().is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
    }

    pub fn matches(&self, item: &Item) -> bool {
        if let Some(name) = self.name() {
            if !item.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        if let Some(category) = self.category() {
            if item.category != category {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| item.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| item.price > max) {
            return false;
        }
        true
    }
}

/// Filter predicate for item collections.
pub enum ItemFilter {
    All,
    InStock,
    ByCategory(String),
    Search(SearchFilter),
    Custom(Box<dyn Fn(&Item) -> bool + Send + Sync>),
}

impl ItemFilter {
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Self::All => true,
            Self::InStock => item.in_stock(),
            Self::ByCategory(category) => item.category == *category,
            Self::Search(search) => search.matches(item),
            Self::Custom(f) => f(item),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl std::fmt::Debug for ItemFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::InStock => f.write_str("InStock"),
            Self::ByCategory(c) => f.debug_tuple("ByCategory").field(c).finish(),
            Self::Search(s) => f.debug_tuple("Search").field(s).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemId;

    fn item(name: &str, category: &str, price: f64, quantity: u32) -> Item {
        Item {
            id: ItemId::Numeric(1),
            name: name.into(),
            category: category.into(),
            price,
            quantity,
        }
    }

    #[test]
    fn name_is_case_insensitive_substring() {
        let filter = SearchFilter {
            name: Some("FUD".into()),
            ..SearchFilter::default()
        };
        assert!(filter.matches(&item("Chocolate Fudge", "Candy", 1.0, 1)));
        assert!(!filter.matches(&item("Toffee", "Candy", 1.0, 1)));
    }

    #[test]
    fn category_is_exact() {
        let filter = SearchFilter {
            category: Some("Candy".into()),
            ..SearchFilter::default()
        };
        assert!(filter.matches(&item("Fudge", "Candy", 1.0, 1)));
        assert!(!filter.matches(&item("Fudge", "candy", 1.0, 1)));
    }

    #[test]
    fn price_bounds_are_inclusive() {
        let filter = SearchFilter {
            min_price: Some(2.0),
            max_price: Some(3.0),
            ..SearchFilter::default()
        };
        assert!(filter.matches(&item("a", "c", 2.0, 1)));
        assert!(filter.matches(&item("a", "c", 3.0, 1)));
        assert!(!filter.matches(&item("a", "c", 1.99, 1)));
        assert!(!filter.matches(&item("a", "c", 3.01, 1)));
    }

    #[test]
    fn empty_search_matches_everything() {
        let filter = SearchFilter::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&item("anything", "any", 0.0, 0)));
    }

    #[test]
    fn blank_text_criteria_are_ignored() {
        let filter = SearchFilter {
            name: Some(String::new()),
            category: Some(String::new()),
            ..SearchFilter::default()
        };
        assert!(filter.is_empty());
        assert_eq!(filter.category(), None);
        assert!(filter.matches(&item("Fudge", "Candy", 1.0, 1)));

        let priced = SearchFilter {
            category: Some(String::new()),
            max_price: Some(2.0),
            ..SearchFilter::default()
        };
        assert!(!priced.is_empty());
        assert!(priced.matches(&item("Fudge", "Candy", 1.0, 1)));
        assert!(!priced.matches(&item("Fudge", "Candy", 3.0, 1)));
    }

    #[test]
    fn stock_filters() {
        assert!(ItemFilter::InStock.matches(&item("a", "c", 1.0, 3)));
        assert!(!ItemFilter::InStock.matches(&item("a", "c", 1.0, 0)));
    }
}
