//! One render pass: `(time points, current index)` in, shape descriptions out.
//! Nothing here touches selection state or the element registries.

use std::collections::HashSet;

use crate::color::{category_color, Color};
use crate::config::RenderConfig;
use crate::label::truncate;
use crate::model::{ItemKey, LayoutNode, NodeKind, TimePoint};
use crate::scene::{Attrs, Element, ElementKey, RectAttrs, TextAttrs};
use crate::sparkline::{render_series, SeriesTable};
use crate::timeline::timeline_elements;
use crate::treemap::layout;

#[derive(Debug, Clone, Default)]
pub struct Scenes {
    pub timeline: Vec<Element>,
    pub treemap: Vec<Element>,
    pub layout: Vec<LayoutNode>,
}

/// Keys of the `n` leaves with the largest volume; ties keep input order.
pub fn top_leaves(tp: &TimePoint, n: usize) -> HashSet<ItemKey> {
    let mut leaves: Vec<(ItemKey, f64)> = tp.leaves().map(|(k, _, i)| (k, i.volume)).collect();
    leaves.sort_by(|a, b| b.1.total_cmp(&a.1));
    leaves.into_iter().take(n).map(|(k, _)| k).collect()
}

pub fn render(
    time_points: &[TimePoint],
    series: &SeriesTable,
    index: usize,
    cfg: &RenderConfig,
) -> Scenes {
    let timeline = timeline_elements(time_points, index, cfg);
    let Some(tp) = time_points.get(index) else {
        return Scenes {
            timeline,
            ..Scenes::default()
        };
    };
    let nodes = layout(tp, cfg.width, cfg.height, cfg.padding);
    let treemap = treemap_elements(tp, &nodes, series, index, cfg);
    Scenes {
        timeline,
        treemap,
        layout: nodes,
    }
}

fn tile(node: &LayoutNode, color: Color, cfg: &RenderConfig) -> Attrs {
    Attrs::Rect(RectAttrs {
        x: node.x0,
        y: node.y0,
        width: (node.width() - cfg.stroke_width).max(0.0),
        height: (node.height() - cfg.stroke_width).max(0.0),
        fill: None,
        stroke: color,
        stroke_width: cfg.stroke_width,
        opacity: 1.0,
    })
}

/// Label size follows the item size within the configured range; an
/// inverted range is read with its bounds swapped.
fn clamp_font(size: f64, cfg: &RenderConfig) -> f64 {
    let lo = cfg.font_min.min(cfg.font_max);
    let hi = cfg.font_min.max(cfg.font_max);
    size.max(lo).min(hi)
}

/// Tiles first, then labels, then sparklines, so trend lines sit on top.
pub fn treemap_elements(
    tp: &TimePoint,
    nodes: &[LayoutNode],
    series: &SeriesTable,
    index: usize,
    cfg: &RenderConfig,
) -> Vec<Element> {
    let names: Vec<&str> = tp.categories.iter().map(|c| c.name.as_str()).collect();
    let color_of = |name: Option<&str>| {
        category_color(name.and_then(|n| names.iter().position(|c| *c == n)), names.len())
    };
    let labelled = top_leaves(tp, cfg.top_labels);

    let mut tiles = Vec::with_capacity(nodes.len());
    let mut labels = Vec::new();
    let mut sparks = Vec::new();
    for node in nodes {
        match node.kind {
            NodeKind::Root => {}
            NodeKind::Category => tiles.push(Element::new(
                ElementKey::CategoryTile(node.name.clone()),
                tile(node, color_of(Some(node.name.as_str())), cfg),
            )),
            NodeKind::Item => {
                let Some(key) = node.key.clone() else { continue };
                let color = color_of(node.parent_name.as_deref());
                tiles.push(Element::new(ElementKey::LeafTile(key.clone()), tile(node, color, cfg)));

                let (cx, cy) = node.center();
                labels.push(Element::new(
                    ElementKey::LeafLabel(key.clone()),
                    Attrs::Text(TextAttrs {
                        x: cx - cfg.spark_margin,
                        y: cy - cfg.spark_margin,
                        text: truncate(&node.name, cfg.label_max_chars),
                        font_size: clamp_font(node.size, cfg),
                        fill: color,
                        bold: true,
                        opacity: 1.0,
                        visible: labelled.contains(&key),
                    }),
                ));

                if let Some(values) = series.get(&key) {
                    let geometry = render_series(values, node, index, cfg);
                    sparks.extend(geometry.to_elements(&key, color));
                }
            }
        }
    }
    tiles.extend(labels);
    tiles.extend(sparks);
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Item};

    fn tp(count: u64) -> TimePoint {
        TimePoint {
            label: "2024-01-05".into(),
            categories: vec![Category {
                name: "G".into(),
                items: (1..=count)
                    .map(|id| Item {
                        name: format!("Company number {id}"),
                        id,
                        value: id as f64,
                        volume: id as f64,
                        traded: 0.0,
                        size: (id as f64 / count as f64).sqrt() * 10.0,
                    })
                    .collect(),
            }],
        }
    }

    #[test]
    fn only_top_volume_leaves_get_visible_labels() {
        let tps = vec![tp(40)];
        let series = SeriesTable::build(&tps);
        let scenes = render(&tps, &series, 0, &RenderConfig::default());
        let labels: Vec<&TextAttrs> = scenes
            .treemap
            .iter()
            .filter_map(|e| match (&e.key, &e.attrs) {
                (ElementKey::LeafLabel(_), Attrs::Text(t)) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(labels.len(), 40);
        assert_eq!(labels.iter().filter(|t| t.visible).count(), 30);
        let hidden = scenes.treemap.iter().find(|e| {
            e.key == ElementKey::LeafLabel(ItemKey::new("G", 1))
        });
        assert!(matches!(hidden.map(|e| &e.attrs), Some(Attrs::Text(t)) if !t.visible));
    }

    #[test]
    fn every_leaf_gets_tile_and_sparkline() {
        let tps = vec![tp(40)];
        let series = SeriesTable::build(&tps);
        let scenes = render(&tps, &series, 0, &RenderConfig::default());
        let count = |f: fn(&ElementKey) -> bool| scenes.treemap.iter().filter(|e| f(&e.key)).count();
        assert_eq!(count(|k| matches!(k, ElementKey::LeafTile(_))), 40);
        assert_eq!(count(|k| matches!(k, ElementKey::SparkLine(_))), 40);
        assert_eq!(count(|k| matches!(k, ElementKey::CategoryTile(_))), 1);
    }

    #[test]
    fn labels_are_truncated_and_font_clamped() {
        let tps = vec![tp(2)];
        let series = SeriesTable::build(&tps);
        let scenes = render(&tps, &series, 0, &RenderConfig::default());
        for e in &scenes.treemap {
            if let (ElementKey::LeafLabel(_), Attrs::Text(t)) = (&e.key, &e.attrs) {
                assert_eq!(t.text, "Company...");
                assert!(t.font_size >= 8.0 && t.font_size <= 12.0);
            }
        }
    }

    #[test]
    fn inverted_font_range_does_not_panic() {
        let cfg = RenderConfig {
            font_min: 14.0,
            font_max: 9.0,
            ..RenderConfig::default()
        };
        let tps = vec![tp(2)];
        let scenes = render(&tps, &SeriesTable::build(&tps), 0, &cfg);
        let sizes: Vec<f64> = scenes
            .treemap
            .iter()
            .filter_map(|e| match (&e.key, &e.attrs) {
                (ElementKey::LeafLabel(_), Attrs::Text(t)) => Some(t.font_size),
                _ => None,
            })
            .collect();
        assert_eq!(sizes.len(), 2);
        assert!(sizes.iter().all(|s| (9.0..=14.0).contains(s)));
    }

    #[test]
    fn fixed_text_sizes_come_from_config() {
        let cfg = RenderConfig {
            timeline_font_size: 13.0,
            value_font_size: 7.0,
            ..RenderConfig::default()
        };
        let tps = vec![tp(2)];
        let scenes = render(&tps, &SeriesTable::build(&tps), 0, &cfg);
        let size_of = |elements: &[Element], want: fn(&ElementKey) -> bool| -> Vec<f64> {
            elements
                .iter()
                .filter(|e| want(&e.key))
                .filter_map(|e| match &e.attrs {
                    Attrs::Text(t) => Some(t.font_size),
                    _ => None,
                })
                .collect()
        };
        assert_eq!(size_of(&scenes.timeline, |k| matches!(k, ElementKey::TimelineLabel(_))), vec![13.0]);
        assert_eq!(size_of(&scenes.treemap, |k| matches!(k, ElementKey::SparkValue(_))), vec![7.0, 7.0]);
    }

    #[test]
    fn out_of_range_index_renders_empty_treemap() {
        let tps = vec![tp(3)];
        let series = SeriesTable::build(&tps);
        let scenes = render(&tps, &series, 5, &RenderConfig::default());
        assert!(scenes.treemap.is_empty());
        assert!(scenes.layout.is_empty());
    }

    #[test]
    fn empty_dataset_renders_nothing() {
        let scenes = render(&[], &SeriesTable::default(), 0, &RenderConfig::default());
        assert!(scenes.timeline.is_empty());
        assert!(scenes.treemap.is_empty());
    }
}
