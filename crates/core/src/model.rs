use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a leaf across frames: `category/id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey(String);

impl ItemKey {
    pub fn new(category: &str, id: u64) -> Self {
        ItemKey(format!("{category}/{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub id: u64,
    /// Closing value; the quantity the sparklines trace.
    pub value: f64,
    pub volume: f64,
    pub traded: f64,
    /// Visual weight derived from `volume` by the normalizer. Never negative or NaN.
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub items: Vec<Item>,
}

impl Category {
    pub fn item_key(&self, item: &Item) -> ItemKey {
        ItemKey::new(&self.name, item.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub label: String,
    pub categories: Vec<Category>,
}

impl TimePoint {
    /// Every leaf of this snapshot with its identity key, in input order.
    pub fn leaves(&self) -> impl Iterator<Item = (ItemKey, &Category, &Item)> {
        self.categories
            .iter()
            .flat_map(|c| c.items.iter().map(move |i| (c.item_key(i), c, i)))
    }

    pub fn find(&self, key: &ItemKey) -> Option<&Item> {
        self.leaves().find(|(k, _, _)| k == key).map(|(_, _, i)| i)
    }

    pub fn total_size(&self) -> f64 {
        self.categories
            .iter()
            .flat_map(|c| c.items.iter())
            .map(|i| i.size)
            .sum()
    }
}

/// Output of normalization: the canonical time series plus every
/// recoverable issue met along the way.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub time_points: Vec<TimePoint>,
    pub issues: Vec<crate::error::NormalizeError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Root,
    Category,
    Item,
}

/// A node of the computed treemap with its integer rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutNode {
    pub kind: NodeKind,
    pub name: String,
    /// Set for `NodeKind::Item` only.
    pub key: Option<ItemKey>,
    pub parent_name: Option<String>,
    pub depth: u8,
    pub path_index: String,
    pub weight: f64,
    pub volume: f64,
    pub size: f64,
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl LayoutNode {
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x0 + self.width() / 2.0, self.y0 + self.height() / 2.0)
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == NodeKind::Item
    }
}
