//! Immutable shape descriptions: what a renderer should draw, keyed by identity.

use serde::Serialize;

use crate::color::Color;
use crate::model::ItemKey;

/// The one message interactive elements emit: "select this time index".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct IndexChanged(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Surface {
    Timeline,
    Treemap,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ElementKey {
    CategoryTile(String),
    LeafTile(ItemKey),
    LeafLabel(ItemKey),
    SparkLine(ItemKey),
    SparkMarker(ItemKey, usize),
    SparkValue(ItemKey),
    TimelineAxis,
    TimelineNode(usize),
    TimelineLabel(usize),
}

impl ElementKey {
    pub fn item(&self) -> Option<&ItemKey> {
        match self {
            ElementKey::LeafTile(k)
            | ElementKey::LeafLabel(k)
            | ElementKey::SparkLine(k)
            | ElementKey::SparkMarker(k, _)
            | ElementKey::SparkValue(k) => Some(k),
            _ => None,
        }
    }

    /// A markup-safe identifier.
    pub fn dom_id(&self) -> String {
        let raw = match self {
            ElementKey::CategoryTile(name) => format!("cat-{name}"),
            ElementKey::LeafTile(k) => format!("tile-{k}"),
            ElementKey::LeafLabel(k) => format!("label-{k}"),
            ElementKey::SparkLine(k) => format!("spark-{k}"),
            ElementKey::SparkMarker(k, i) => format!("marker-{k}-{i}"),
            ElementKey::SparkValue(k) => format!("value-{k}"),
            ElementKey::TimelineAxis => "timeline-axis".to_string(),
            ElementKey::TimelineNode(i) => format!("timeline-node-{i}"),
            ElementKey::TimelineLabel(i) => format!("timeline-label-{i}"),
        };
        raw.chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RectAttrs {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: Option<Color>,
    pub stroke: Color,
    pub stroke_width: f64,
    pub opacity: f64,
}

/// Text is anchored at its horizontal middle and baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextAttrs {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub font_size: f64,
    pub fill: Color,
    pub bold: bool,
    pub opacity: f64,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircleAttrs {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
    pub fill: Option<Color>,
    pub stroke: Color,
    pub stroke_width: f64,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineAttrs {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub stroke: Color,
    pub stroke_width: f64,
    pub opacity: f64,
}

/// A polyline; `None` entries are gaps that split it into segments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathAttrs {
    pub points: Vec<Option<Point>>,
    pub stroke: Color,
    pub stroke_width: f64,
    pub opacity: f64,
}

impl PathAttrs {
    pub fn segments(&self) -> Vec<Vec<Point>> {
        self.points
            .split(|p| p.is_none())
            .filter(|run| !run.is_empty())
            .map(|run| run.iter().flatten().copied().collect())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Attrs {
    Rect(RectAttrs),
    Text(TextAttrs),
    Circle(CircleAttrs),
    Line(LineAttrs),
    Path(PathAttrs),
}

/// Linear interpolation between two visual states, `t` in `[0, 1]`.
pub trait Lerp {
    fn lerp(&self, to: &Self, t: f64) -> Self;
}

fn mix(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

impl Lerp for Color {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        self.blend(to, t)
    }
}

impl Lerp for Option<Color> {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        match (self, to) {
            (Some(a), Some(b)) => Some(a.lerp(b, t)),
            _ => *to,
        }
    }
}

impl Lerp for Point {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        Point::new(mix(self.x, to.x, t), mix(self.y, to.y, t))
    }
}

impl Lerp for Attrs {
    fn lerp(&self, to: &Self, t: f64) -> Self {
        if t >= 1.0 {
            return to.clone();
        }
        match (self, to) {
            (Attrs::Rect(a), Attrs::Rect(b)) => Attrs::Rect(RectAttrs {
                x: mix(a.x, b.x, t),
                y: mix(a.y, b.y, t),
                width: mix(a.width, b.width, t),
                height: mix(a.height, b.height, t),
                fill: a.fill.lerp(&b.fill, t),
                stroke: a.stroke.lerp(&b.stroke, t),
                stroke_width: mix(a.stroke_width, b.stroke_width, t),
                opacity: mix(a.opacity, b.opacity, t),
            }),
            (Attrs::Text(a), Attrs::Text(b)) => Attrs::Text(TextAttrs {
                x: mix(a.x, b.x, t),
                y: mix(a.y, b.y, t),
                text: b.text.clone(),
                font_size: mix(a.font_size, b.font_size, t),
                fill: a.fill.lerp(&b.fill, t),
                bold: b.bold,
                opacity: mix(a.opacity, b.opacity, t),
                visible: b.visible,
            }),
            (Attrs::Circle(a), Attrs::Circle(b)) => Attrs::Circle(CircleAttrs {
                cx: mix(a.cx, b.cx, t),
                cy: mix(a.cy, b.cy, t),
                r: mix(a.r, b.r, t),
                fill: a.fill.lerp(&b.fill, t),
                stroke: a.stroke.lerp(&b.stroke, t),
                stroke_width: mix(a.stroke_width, b.stroke_width, t),
                opacity: mix(a.opacity, b.opacity, t),
            }),
            (Attrs::Line(a), Attrs::Line(b)) => Attrs::Line(LineAttrs {
                x1: mix(a.x1, b.x1, t),
                y1: mix(a.y1, b.y1, t),
                x2: mix(a.x2, b.x2, t),
                y2: mix(a.y2, b.y2, t),
                stroke: a.stroke.lerp(&b.stroke, t),
                stroke_width: mix(a.stroke_width, b.stroke_width, t),
                opacity: mix(a.opacity, b.opacity, t),
            }),
            (Attrs::Path(a), Attrs::Path(b)) => {
                // point-wise only when both shapes line up; otherwise snap
                let points = if a.points.len() == b.points.len() {
                    a.points
                        .iter()
                        .zip(&b.points)
                        .map(|(p, q)| match (p, q) {
                            (Some(p), Some(q)) => Some(p.lerp(q, t)),
                            _ => *q,
                        })
                        .collect()
                } else {
                    b.points.clone()
                };
                Attrs::Path(PathAttrs {
                    points,
                    stroke: a.stroke.lerp(&b.stroke, t),
                    stroke_width: mix(a.stroke_width, b.stroke_width, t),
                    opacity: mix(a.opacity, b.opacity, t),
                })
            }
            _ => to.clone(),
        }
    }
}

impl Attrs {
    /// The zero state an entering element grows from and an exiting one shrinks to.
    pub fn neutral(&self) -> Attrs {
        match self {
            Attrs::Rect(a) => Attrs::Rect(RectAttrs {
                width: 0.0,
                height: 0.0,
                opacity: 0.0,
                ..a.clone()
            }),
            Attrs::Text(a) => Attrs::Text(TextAttrs {
                font_size: 0.0,
                opacity: 0.0,
                ..a.clone()
            }),
            Attrs::Circle(a) => Attrs::Circle(CircleAttrs {
                r: 0.0,
                opacity: 0.0,
                ..a.clone()
            }),
            Attrs::Line(a) => Attrs::Line(LineAttrs {
                x2: a.x1,
                y2: a.y1,
                opacity: 0.0,
                ..a.clone()
            }),
            Attrs::Path(a) => Attrs::Path(PathAttrs {
                opacity: 0.0,
                ..a.clone()
            }),
        }
    }

    pub fn opacity(&self) -> f64 {
        match self {
            Attrs::Rect(a) => a.opacity,
            Attrs::Text(a) => a.opacity,
            Attrs::Circle(a) => a.opacity,
            Attrs::Line(a) => a.opacity,
            Attrs::Path(a) => a.opacity,
        }
    }

    /// Whether `(x, y)` falls on the shape. Text uses an approximate box.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        match self {
            Attrs::Rect(a) => x >= a.x && x <= a.x + a.width && y >= a.y && y <= a.y + a.height,
            Attrs::Circle(a) => {
                let (dx, dy) = (x - a.cx, y - a.cy);
                dx * dx + dy * dy <= a.r * a.r
            }
            Attrs::Text(a) => {
                let half = a.text.chars().count() as f64 * a.font_size * 0.3;
                a.visible && x >= a.x - half && x <= a.x + half && y >= a.y - a.font_size && y <= a.y
            }
            Attrs::Line(_) | Attrs::Path(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub key: ElementKey,
    pub attrs: Attrs,
    pub on_click: Option<IndexChanged>,
}

impl Element {
    pub fn new(key: ElementKey, attrs: Attrs) -> Self {
        Self {
            key,
            attrs,
            on_click: None,
        }
    }

    pub fn clickable(mut self, index: usize) -> Self {
        self.on_click = Some(IndexChanged(index));
        self
    }
}

/// Topmost interactive element under `(x, y)`; later elements draw on top.
pub fn hit_test<'a>(elements: impl DoubleEndedIterator<Item = &'a Element>, x: f64, y: f64) -> Option<IndexChanged> {
    elements
        .rev()
        .filter(|e| e.on_click.is_some())
        .find(|e| e.attrs.contains(x, y))
        .and_then(|e| e.on_click)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f64, width: f64) -> Attrs {
        Attrs::Rect(RectAttrs {
            x,
            y: 0.0,
            width,
            height: 10.0,
            fill: None,
            stroke: Color::BLACK,
            stroke_width: 1.0,
            opacity: 1.0,
        })
    }

    #[test]
    fn rect_interpolates_geometry() {
        let mid = rect(0.0, 10.0).lerp(&rect(10.0, 30.0), 0.5);
        match mid {
            Attrs::Rect(r) => {
                assert_eq!(r.x, 5.0);
                assert_eq!(r.width, 20.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn neutral_rect_is_invisible_and_empty() {
        match rect(3.0, 10.0).neutral() {
            Attrs::Rect(r) => {
                assert_eq!(r.x, 3.0);
                assert_eq!(r.width, 0.0);
                assert_eq!(r.opacity, 0.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn path_segments_split_on_gaps() {
        let path = PathAttrs {
            points: vec![
                Some(Point::new(0.0, 0.0)),
                Some(Point::new(1.0, 1.0)),
                None,
                Some(Point::new(3.0, 3.0)),
            ],
            stroke: Color::BLACK,
            stroke_width: 0.5,
            opacity: 1.0,
        };
        let segments = path.segments();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].len(), 2);
        assert_eq!(segments[1], vec![Point::new(3.0, 3.0)]);
    }

    #[test]
    fn hit_test_prefers_topmost() {
        let elements = vec![
            Element::new(ElementKey::TimelineNode(0), rect(0.0, 100.0)).clickable(0),
            Element::new(ElementKey::TimelineNode(1), rect(50.0, 10.0)).clickable(1),
            Element::new(ElementKey::TimelineAxis, rect(0.0, 100.0)),
        ];
        assert_eq!(hit_test(elements.iter(), 55.0, 5.0), Some(IndexChanged(1)));
        assert_eq!(hit_test(elements.iter(), 20.0, 5.0), Some(IndexChanged(0)));
        assert_eq!(hit_test(elements.iter(), 200.0, 5.0), None);
    }

    #[test]
    fn dom_ids_are_sanitised() {
        let key = ElementKey::LeafTile(ItemKey::new("Oil & Coal", 5019));
        assert_eq!(key.dom_id(), "tile-Oil___Coal_5019");
    }
}
