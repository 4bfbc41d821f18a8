// ── Inventory item domain types ──

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ── ItemId ──────────────────────────────────────────────────────────

/// Server-assigned item identifier.
///
/// The reference service hands out integers; string ids are carried
/// through untouched. Numeric ids sort numerically and before string ids,
/// which gives collection snapshots a stable order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Numeric(i64),
    Opaque(String),
}

impl ItemId {
    pub fn as_numeric(&self) -> Option<i64> {
        match self {
            Self::Numeric(n) => Some(*n),
            Self::Opaque(_) => None,
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Opaque(s) => f.write_str(s),
        }
    }
}

impl FromStr for ItemId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<i64> for ItemId {
    fn from(n: i64) -> Self {
        Self::Numeric(n)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        match s.parse::<i64>() {
            Ok(n) => Self::Numeric(n),
            Err(_) => Self::Opaque(s.to_owned()),
        }
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        match s.parse::<i64>() {
            Ok(n) => Self::Numeric(n),
            Err(_) => Self::Opaque(s),
        }
    }
}

// ── Item ────────────────────────────────────────────────────────────

/// A single inventory item as last reported by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub quantity: u32,
}

impl Item {
    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

#[cfg(test)]
mod tests {
    use super::ItemId;

    #[test]
    fn parses_numeric_and_opaque_ids() {
        assert_eq!(ItemId::from("42"), ItemId::Numeric(42));
        assert_eq!(ItemId::from("sku-7"), ItemId::Opaque("sku-7".into()));
        assert_eq!(ItemId::from(String::from("-3")), ItemId::Numeric(-3));
    }

    #[test]
    fn numeric_ids_sort_before_strings() {
        let mut ids = vec![
            ItemId::Opaque("a".into()),
            ItemId::Numeric(10),
            ItemId::Numeric(2),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                ItemId::Numeric(2),
                ItemId::Numeric(10),
                ItemId::Opaque("a".into())
            ]
        );
    }

    #[test]
    fn display_matches_path_segment() {
        assert_eq!(ItemId::Numeric(5).to_string(), "5");
        assert_eq!(ItemId::Opaque("x1".into()).to_string(), "x1");
    }
}
