//! Squarified treemap over the two-level category → item hierarchy.

use tracing::debug;

use crate::model::{LayoutNode, NodeKind, TimePoint};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    fn empty_at(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0, 0.0)
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Shrink by `p` on every side. A side that would invert collapses onto its midpoint.
    pub fn inset(&self, p: f64) -> Rect {
        let (mut x0, mut x1) = (self.x + p, self.x + self.w - p);
        let (mut y0, mut y1) = (self.y + p, self.y + self.h - p);
        if x1 < x0 {
            x0 = (x0 + x1) / 2.0;
            x1 = x0;
        }
        if y1 < y0 {
            y0 = (y0 + y1) / 2.0;
            y1 = y0;
        }
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }
}

/// Partition `area` among `weights`, returning one rectangle per weight in input order.
///
/// Runs are grown while the worst aspect ratio in the run keeps improving, then laid
/// along the shorter side of the remaining space. Callers get the best result when
/// weights are sorted in descending order. Zero weights produce zero-area rectangles.
pub fn squarify(weights: &[f64], area: Rect) -> Vec<Rect> {
    let weight = |i: usize| weights[i].max(0.0);
    let mut out = vec![Rect::empty_at(area.x, area.y); weights.len()];
    let mut remaining = area;
    let mut remaining_weight: f64 = (0..weights.len()).map(weight).sum();

    let mut start = 0;
    while start < weights.len() {
        let side = remaining.w.min(remaining.h);
        if remaining_weight <= 0.0 || side <= 0.0 {
            for r in &mut out[start..] {
                *r = Rect::empty_at(remaining.x, remaining.y);
            }
            break;
        }
        let scale = remaining.area() / remaining_weight;

        let mut end = start + 1;
        let mut row_sum = weight(start);
        let mut worst = worst_ratio(&weights[start..end], row_sum, side, scale);
        while end < weights.len() {
            let next_sum = row_sum + weight(end);
            let next = worst_ratio(&weights[start..=end], next_sum, side, scale);
            if next > worst {
                break;
            }
            row_sum = next_sum;
            worst = next;
            end += 1;
        }

        let last = weights[end..].iter().all(|w| *w <= 0.0);
        remaining = place_row(
            &weights[start..end],
            row_sum,
            remaining_weight,
            remaining,
            last,
            &mut out[start..end],
        );
        remaining_weight -= row_sum;
        start = end;
    }
    out
}

fn worst_ratio(row: &[f64], row_sum: f64, side: f64, scale: f64) -> f64 {
    let (min, max) = row
        .iter()
        .map(|w| w.max(0.0))
        .fold((f64::INFINITY, 0.0_f64), |(lo, hi), w| (lo.min(w), hi.max(w)));
    let s = row_sum * scale;
    if min <= 0.0 || s <= 0.0 {
        return f64::INFINITY;
    }
    let side2 = side * side;
    f64::max(side2 * max * scale / (s * s), s * s / (side2 * min * scale))
}

/// Lay one run along the shorter side of `remaining` and return what is left.
fn place_row(
    row: &[f64],
    row_sum: f64,
    remaining_weight: f64,
    remaining: Rect,
    last: bool,
    out: &mut [Rect],
) -> Rect {
    let fraction = if last { 1.0 } else { row_sum / remaining_weight };
    let wide = remaining.w >= remaining.h;
    let (thickness, length) = if wide {
        (remaining.w * fraction, remaining.h)
    } else {
        (remaining.h * fraction, remaining.w)
    };
    let origin = if wide { remaining.y } else { remaining.x };

    let mut cursor = origin;
    let mut acc = 0.0;
    for (i, (w, r)) in row.iter().zip(out.iter_mut()).enumerate() {
        acc += w.max(0.0);
        // the final edge of the run absorbs accumulated float residue
        let edge = if i + 1 == row.len() {
            origin + length
        } else if row_sum > 0.0 {
            origin + length * acc / row_sum
        } else {
            origin
        };
        *r = if wide {
            Rect::new(remaining.x, cursor, thickness, edge - cursor)
        } else {
            Rect::new(cursor, remaining.y, edge - cursor, thickness)
        };
        cursor = edge;
    }

    if wide {
        Rect::new(remaining.x + thickness, remaining.y, remaining.w - thickness, remaining.h)
    } else {
        Rect::new(remaining.x, remaining.y + thickness, remaining.w, remaining.h - thickness)
    }
}

/// Indices of `weights` ordered by descending weight; ties keep input order.
fn descending(weights: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..weights.len()).collect();
    order.sort_by(|&a, &b| weights[b].total_cmp(&weights[a]));
    order
}

/// Tile `children` inside `parent`, applying half the padding around the
/// parent's content area and half around every child.
fn tile_children(weights: &[f64], parent: Rect, padding: f64) -> Vec<Rect> {
    let order = descending(weights);
    let sorted: Vec<f64> = order.iter().map(|&i| weights[i]).collect();
    let tiles = squarify(&sorted, parent.inset(padding / 2.0));
    let mut out = vec![Rect::default(); weights.len()];
    for (tile, &i) in tiles.into_iter().zip(&order) {
        out[i] = tile.inset(padding / 2.0);
    }
    out
}

/// Compute the treemap of one time point.
///
/// The output is pre-order: the root, then each category followed by its
/// items, all in input order. Coordinates are rounded to whole pixels;
/// rounding is monotonic so containment and non-overlap survive it.
pub fn layout(tp: &TimePoint, width: f64, height: f64, padding: f64) -> Vec<LayoutNode> {
    let root_rect = Rect::new(0.0, 0.0, width.max(0.0), height.max(0.0));
    let category_weights: Vec<f64> = tp
        .categories
        .iter()
        .map(|c| c.items.iter().map(|i| i.size).sum())
        .collect();
    let total: f64 = category_weights.iter().sum();
    if total <= 0.0 {
        debug!(time_point = %tp.label, "degenerate layout: total weight is zero");
    }

    let mut nodes = Vec::with_capacity(1 + tp.categories.len() * 8);
    nodes.push(node(
        NodeKind::Root,
        tp.label.clone(),
        None,
        0,
        "0".to_string(),
        total,
        tp.categories.iter().flat_map(|c| &c.items).map(|i| i.volume).sum(),
        total,
        root_rect,
    ));

    let category_rects = tile_children(&category_weights, root_rect, padding);
    for (ci, (cat, cat_rect)) in tp.categories.iter().zip(category_rects).enumerate() {
        let path = format!("0.{ci}");
        nodes.push(node(
            NodeKind::Category,
            cat.name.clone(),
            None,
            1,
            path.clone(),
            category_weights[ci],
            cat.items.iter().map(|i| i.volume).sum(),
            category_weights[ci],
            cat_rect,
        ));

        let item_weights: Vec<f64> = cat.items.iter().map(|i| i.size).collect();
        let item_rects = tile_children(&item_weights, cat_rect, padding);
        for (ii, (item, rect)) in cat.items.iter().zip(item_rects).enumerate() {
            let mut leaf = node(
                NodeKind::Item,
                item.name.clone(),
                Some(cat.name.clone()),
                2,
                format!("{path}.{ii}"),
                item.size,
                item.volume,
                item.size,
                rect,
            );
            leaf.key = Some(cat.item_key(item));
            nodes.push(leaf);
        }
    }
    nodes
}

#[allow(clippy::too_many_arguments)]
fn node(
    kind: NodeKind,
    name: String,
    parent_name: Option<String>,
    depth: u8,
    path_index: String,
    weight: f64,
    volume: f64,
    size: f64,
    r: Rect,
) -> LayoutNode {
    LayoutNode {
        kind,
        name,
        key: None,
        parent_name,
        depth,
        path_index,
        weight,
        volume,
        size,
        x0: r.x.round(),
        y0: r.y.round(),
        x1: (r.x + r.w).round(),
        y1: (r.y + r.h).round(),
    }
}
