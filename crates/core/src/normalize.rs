//! Translation from the raw feed shape into the canonical [`TimePoint`] tree.
//!
//! This is the only place that looks at loosely-typed input. Everything
//! downstream works on the validated model.

use std::collections::HashSet;

use serde::Deserialize;
use tracing::warn;

use crate::error::NormalizeError;
use crate::model::{Category, Dataset, Item, TimePoint};

#[derive(Debug, Clone, Deserialize)]
pub struct RawTimePoint {
    #[serde(alias = "word")]
    pub date: String,
    #[serde(alias = "children", default)]
    pub categories: Vec<RawCategory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCategory {
    #[serde(alias = "word")]
    pub name: String,
    /// Kept undecoded so one bad item cannot fail the whole document.
    #[serde(alias = "children", default)]
    pub items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    #[serde(alias = "word")]
    name: Option<String>,
    #[serde(alias = "code")]
    id: Option<f64>,
    close: Option<f64>,
    volume: Option<f64>,
    total: Option<f64>,
}

pub fn parse(text: &str) -> Result<Vec<RawTimePoint>, serde_json::Error> {
    serde_json::from_str(text)
}

/// Normalize every time point, keeping input order.
pub fn normalize(raw: &[RawTimePoint], size_scale: f64) -> Dataset {
    let mut issues = Vec::new();
    let time_points = raw
        .iter()
        .map(|tp| normalize_time_point(tp, size_scale, &mut issues))
        .collect();
    Dataset { time_points, issues }
}

pub fn normalize_time_point(
    raw: &RawTimePoint,
    size_scale: f64,
    issues: &mut Vec<NormalizeError>,
) -> TimePoint {
    let mut categories = Vec::with_capacity(raw.categories.len());
    let mut names = HashSet::new();
    for cat in &raw.categories {
        if !names.insert(cat.name.as_str()) {
            let issue = NormalizeError::DuplicateCategory {
                time_point: raw.date.clone(),
                category: cat.name.clone(),
            };
            warn!("{issue}");
            issues.push(issue);
            continue;
        }
        let mut items = Vec::with_capacity(cat.items.len());
        let mut ids = HashSet::new();
        for (position, value) in cat.items.iter().enumerate() {
            let decoded = decode_item(value).and_then(|item| {
                if ids.insert(item.id) {
                    Ok(item)
                } else {
                    Err(format!("duplicate id {}", item.id))
                }
            });
            match decoded {
                Ok(item) => items.push(item),
                Err(reason) => {
                    let issue = NormalizeError::MalformedRecord {
                        time_point: raw.date.clone(),
                        category: cat.name.clone(),
                        position,
                        reason,
                    };
                    warn!("{issue}");
                    issues.push(issue);
                }
            }
        }
        if items.is_empty() {
            let issue = NormalizeError::EmptyCategory {
                time_point: raw.date.clone(),
                category: cat.name.clone(),
            };
            warn!("{issue}");
            issues.push(issue);
            continue;
        }
        assign_sizes(&mut items, size_scale);
        categories.push(Category {
            name: cat.name.clone(),
            items,
        });
    }
    TimePoint {
        label: raw.date.clone(),
        categories,
    }
}

/// `size = sqrt(volume / max_volume) * scale`, clamped to 0 when either side is 0.
pub fn assign_sizes(items: &mut [Item], size_scale: f64) {
    let denominator = items.iter().map(|i| i.volume).fold(0.0_f64, f64::max);
    for item in items.iter_mut() {
        item.size = if item.volume <= 0.0 || denominator <= 0.0 {
            0.0
        } else {
            (item.volume / denominator).sqrt() * size_scale
        };
    }
}

fn decode_item(value: &serde_json::Value) -> Result<Item, String> {
    let raw: RawItem = serde_json::from_value(value.clone()).map_err(|e| e.to_string())?;
    let id = raw.id.ok_or("missing id")?;
    if !id.is_finite() || id < 0.0 || id.fract() != 0.0 {
        return Err(format!("id {id} is not a non-negative integer"));
    }
    let close = raw.close.ok_or("missing close value")?;
    if !close.is_finite() {
        return Err("close value is not finite".to_string());
    }
    let volume = raw.volume.ok_or("missing volume")?;
    if !volume.is_finite() || volume < 0.0 {
        return Err(format!("volume {volume} is negative or not finite"));
    }
    let id = id as u64;
    Ok(Item {
        name: raw.name.unwrap_or_else(|| id.to_string()),
        id,
        value: close,
        volume,
        traded: raw.total.filter(|t| t.is_finite()).unwrap_or(0.0),
        size: 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> Vec<RawTimePoint> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn sizes_are_relative_to_largest_sibling() {
        let data = raw(json!([{ "date": "2024-01-05", "categories": [
            { "name": "G", "items": [
                { "name": "A", "id": 1, "close": 5.0, "volume": 10, "total": 1 },
                { "name": "B", "id": 2, "close": 7.0, "volume": 100, "total": 1 }
            ]}
        ]}]));
        let ds = normalize(&data, 10.0);
        assert!(ds.issues.is_empty());
        let items = &ds.time_points[0].categories[0].items;
        assert!((items[1].size - 10.0).abs() < 1e-9);
        assert!((items[0].size - 10f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn zero_volume_clamps_to_zero_size() {
        let data = raw(json!([{ "date": "d", "categories": [
            { "name": "G", "items": [
                { "name": "A", "id": 1, "close": 1.0, "volume": 0 },
                { "name": "B", "id": 2, "close": 1.0, "volume": 0 }
            ]}
        ]}]));
        let ds = normalize(&data, 10.0);
        for item in &ds.time_points[0].categories[0].items {
            assert_eq!(item.size, 0.0);
        }
    }

    #[test]
    fn malformed_item_is_skipped_not_fatal() {
        let data = raw(json!([{ "date": "d", "categories": [
            { "name": "G", "items": [
                { "name": "A", "id": 1, "volume": 10 },
                { "name": "B", "id": 2, "close": 3.0, "volume": 40 },
                { "name": "C", "id": "x", "close": 3.0, "volume": 40 }
            ]}
        ]}]));
        let ds = normalize(&data, 10.0);
        let items = &ds.time_points[0].categories[0].items;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "B");
        assert_eq!(ds.issues.len(), 2);
        assert!(matches!(
            ds.issues[0],
            NormalizeError::MalformedRecord { position: 0, .. }
        ));
    }

    #[test]
    fn empty_category_is_dropped() {
        let data = raw(json!([{ "date": "d", "categories": [
            { "name": "Empty", "items": [] },
            { "name": "Bad", "items": [{ "name": "X" }] },
            { "name": "G", "items": [{ "name": "A", "id": 1, "close": 1.0, "volume": 1 }] }
        ]}]));
        let ds = normalize(&data, 10.0);
        let names: Vec<_> = ds.time_points[0].categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["G"]);
        let empties = ds
            .issues
            .iter()
            .filter(|i| matches!(i, NormalizeError::EmptyCategory { .. }))
            .count();
        assert_eq!(empties, 2);
    }

    #[test]
    fn repeated_id_keeps_first_item_only() {
        let data = raw(json!([{ "date": "d", "categories": [
            { "name": "G", "items": [
                { "name": "A", "id": 1, "close": 1.0, "volume": 10 },
                { "name": "B", "id": 1, "close": 2.0, "volume": 20 },
                { "name": "C", "id": 2, "close": 3.0, "volume": 30 }
            ]}
        ]}]));
        let ds = normalize(&data, 10.0);
        let names: Vec<_> = ds.time_points[0].categories[0].items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["A", "C"]);
        assert_eq!(ds.issues.len(), 1);
        assert!(matches!(
            &ds.issues[0],
            NormalizeError::MalformedRecord { position: 1, reason, .. } if reason.contains("duplicate id")
        ));
    }

    #[test]
    fn same_id_in_different_categories_is_fine() {
        let data = raw(json!([{ "date": "d", "categories": [
            { "name": "G", "items": [{ "name": "A", "id": 1, "close": 1.0, "volume": 10 }] },
            { "name": "H", "items": [{ "name": "B", "id": 1, "close": 1.0, "volume": 10 }] }
        ]}]));
        let ds = normalize(&data, 10.0);
        assert!(ds.issues.is_empty());
        assert_eq!(ds.time_points[0].categories.len(), 2);
    }

    #[test]
    fn repeated_category_name_keeps_first() {
        let data = raw(json!([{ "date": "d", "categories": [
            { "name": "G", "items": [{ "name": "A", "id": 1, "close": 1.0, "volume": 10 }] },
            { "name": "G", "items": [{ "name": "B", "id": 2, "close": 1.0, "volume": 10 }] }
        ]}]));
        let ds = normalize(&data, 10.0);
        let cats = &ds.time_points[0].categories;
        assert_eq!(cats.len(), 1);
        assert_eq!(cats[0].items[0].name, "A");
        assert_eq!(
            ds.issues,
            vec![NormalizeError::DuplicateCategory {
                time_point: "d".into(),
                category: "G".into(),
            }]
        );
    }

    #[test]
    fn accepts_word_and_children_aliases() {
        let data = raw(json!([{ "word": "2024-02-01T00:00:00", "children": [
            { "word": "Fishery", "children": [
                { "word": "Maruha", "code": 1333, "close": 3000.0, "volume": 5000, "total": 9 }
            ]}
        ]}]));
        let ds = normalize(&data, 10.0);
        let tp = &ds.time_points[0];
        assert_eq!(tp.label, "2024-02-01T00:00:00");
        assert_eq!(tp.categories[0].items[0].id, 1333);
        assert_eq!(tp.categories[0].items[0].size, 10.0);
    }

    #[test]
    fn keeps_input_order() {
        let data = raw(json!([
            { "date": "2024-03-01", "categories": [] },
            { "date": "2024-01-01", "categories": [] }
        ]));
        let ds = normalize(&data, 10.0);
        assert_eq!(ds.time_points[0].label, "2024-03-01");
        assert_eq!(ds.time_points[1].label, "2024-01-01");
    }
}
