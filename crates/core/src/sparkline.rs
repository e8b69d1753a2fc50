//! Per-leaf trend lines drawn inside treemap tiles.

use std::collections::HashMap;

use crate::color::Color;
use crate::config::RenderConfig;
use crate::model::{ItemKey, LayoutNode, TimePoint};
use crate::scale::{index_to_x, value_to_y};
use crate::scene::{Attrs, CircleAttrs, Element, ElementKey, PathAttrs, Point, TextAttrs};

/// Every leaf's value at every time index. `None` marks a time point the
/// leaf is absent from.
#[derive(Debug, Clone, Default)]
pub struct SeriesTable {
    len: usize,
    series: HashMap<ItemKey, Vec<Option<f64>>>,
}

impl SeriesTable {
    pub fn build(time_points: &[TimePoint]) -> Self {
        let mut table = SeriesTable::default();
        for tp in time_points {
            table.push(tp);
        }
        table
    }

    pub fn push(&mut self, tp: &TimePoint) {
        for (key, _, item) in tp.leaves() {
            self.series
                .entry(key)
                .or_insert_with(|| vec![None; self.len])
                .push(Some(item.value));
        }
        self.len += 1;
        for values in self.series.values_mut() {
            values.resize(self.len, None);
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, key: &ItemKey) -> Option<&[Option<f64>]> {
        self.series.get(key).map(Vec::as_slice)
    }
}

/// Look a leaf up in every time point directly.
pub fn series_for(key: &ItemKey, time_points: &[TimePoint]) -> Vec<Option<f64>> {
    time_points
        .iter()
        .map(|tp| tp.find(key).map(|i| i.value))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub index: usize,
    /// Relative to the sparkline origin.
    pub center: Point,
    pub radius: f64,
    pub current: bool,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SparklineGeometry {
    pub origin: Point,
    pub path: Vec<Option<Point>>,
    pub markers: Vec<Marker>,
    /// Value at the current index and where to print it.
    pub value: Option<(Point, f64)>,
    pub value_font_size: f64,
}

/// Default marker visibility stride, never below 1.
pub fn marker_stride(len: usize, divisor: f64) -> usize {
    if divisor <= 0.0 {
        return 1;
    }
    ((len as f64 / divisor).ceil() as usize).max(1)
}

/// Build the trend geometry of one leaf, boxed at a fixed size near the
/// centre of its tile regardless of how large the tile is.
pub fn render_series(
    series: &[Option<f64>],
    node: &LayoutNode,
    current: usize,
    cfg: &RenderConfig,
) -> SparklineGeometry {
    let (cx, cy) = node.center();
    let origin = Point::new(
        cx - cfg.spark_width / 2.0 + cfg.spark_margin,
        cy + cfg.spark_margin,
    );
    let n = series.len();
    let max = series.iter().flatten().copied().fold(0.0_f64, f64::max);
    let span = cfg.spark_width - 2.0 * cfg.spark_margin;
    let at = |i: usize, v: f64| {
        Point::new(
            index_to_x(i as f64, n as f64, 0.0, span),
            value_to_y(v, max, cfg.spark_height, 0.0),
        )
    };

    let path: Vec<Option<Point>> = series
        .iter()
        .enumerate()
        .map(|(i, v)| v.map(|v| at(i, v)))
        .collect();

    let stride = marker_stride(n, cfg.marker_divisor);
    let markers = path
        .iter()
        .enumerate()
        .filter_map(|(i, p)| {
            let center = (*p)?;
            let is_current = i == current;
            Some(Marker {
                index: i,
                center,
                radius: if is_current { 4.0 } else { 3.0 },
                current: is_current,
                visible: is_current || i == 0 || i + 1 == n || i % stride == 0,
            })
        })
        .collect();

    let value = series.get(current).copied().flatten().map(|v| {
        let x = index_to_x(current as f64, n as f64, 0.0, span);
        (Point::new(x, cfg.font_max), v)
    });

    SparklineGeometry {
        origin,
        path,
        markers,
        value,
        value_font_size: cfg.value_font_size,
    }
}

impl SparklineGeometry {
    /// Absolute scene elements: the line, one clickable marker per present
    /// point (the current one drawn last, on top), then the value text.
    pub fn to_elements(&self, key: &ItemKey, color: Color) -> Vec<Element> {
        let shift = |p: Point| Point::new(p.x + self.origin.x, p.y + self.origin.y);
        let mut out = Vec::with_capacity(self.markers.len() + 2);
        out.push(Element::new(
            ElementKey::SparkLine(key.clone()),
            Attrs::Path(PathAttrs {
                points: self.path.iter().map(|p| p.map(shift)).collect(),
                stroke: color,
                stroke_width: 0.5,
                opacity: 1.0,
            }),
        ));

        let (current, rest): (Vec<&Marker>, Vec<&Marker>) =
            self.markers.iter().partition(|m| m.current);
        for marker in rest.into_iter().chain(current) {
            let center = shift(marker.center);
            out.push(
                Element::new(
                    ElementKey::SparkMarker(key.clone(), marker.index),
                    Attrs::Circle(CircleAttrs {
                        cx: center.x,
                        cy: center.y,
                        r: marker.radius,
                        fill: Some(if marker.current { Color::ORANGE } else { color }),
                        stroke: Color::BLACK,
                        stroke_width: 1.0,
                        opacity: if marker.visible { 1.0 } else { 0.0 },
                    }),
                )
                .clickable(marker.index),
            );
        }

        if let Some((at, v)) = self.value {
            let at = shift(at);
            out.push(Element::new(
                ElementKey::SparkValue(key.clone()),
                Attrs::Text(TextAttrs {
                    x: at.x,
                    y: at.y,
                    text: crate::label::value_text(v),
                    font_size: self.value_font_size,
                    fill: Color::YELLOW,
                    bold: false,
                    opacity: 1.0,
                    visible: true,
                }),
            ));
        }
        out
    }
}
