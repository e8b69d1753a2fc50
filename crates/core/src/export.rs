use std::fmt::Write as _;

use crate::config::RenderConfig;
use crate::model::*;
use crate::scene::{Attrs, Element};
use crate::timeline::Frame;

pub fn layout_to_csv(nodes: &[LayoutNode], mut w: impl std::io::Write) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(&mut w);
    writer.write_record([
        "path_index", "kind", "name", "key", "parent", "depth", "weight", "volume", "size", "x0", "y0",
        "x1", "y1",
    ])?;
    for n in nodes {
        writer.write_record([
            n.path_index.clone(),
            kind_name(n.kind).to_string(),
            n.name.clone(),
            n.key.as_ref().map(|k| k.to_string()).unwrap_or_default(),
            n.parent_name.clone().unwrap_or_default(),
            n.depth.to_string(),
            n.weight.to_string(),
            n.volume.to_string(),
            n.size.to_string(),
            n.x0.to_string(),
            n.y0.to_string(),
            n.x1.to_string(),
            n.y1.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn layout_to_json(nodes: &[LayoutNode]) -> serde_json::Value {
    serde_json::json!(nodes
        .iter()
        .map(|n| serde_json::json!({
            "path_index": n.path_index,
            "kind": kind_name(n.kind),
            "name": n.name,
            "key": n.key.as_ref().map(|k| k.as_str()),
            "parent": n.parent_name,
            "depth": n.depth,
            "weight": n.weight,
            "volume": n.volume,
            "size": n.size,
            "rect": [n.x0, n.y0, n.x1, n.y1],
        }))
        .collect::<Vec<_>>())
}

fn kind_name(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Root => "root",
        NodeKind::Category => "category",
        NodeKind::Item => "item",
    }
}

/// Both surfaces of `frame` as one SVG document, the timeline strip above
/// the treemap canvas.
pub fn to_svg(frame: &Frame, cfg: &RenderConfig) -> String {
    let total_height = cfg.timeline_height + cfg.height;
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = num(cfg.width),
        h = num(total_height)
    );
    let _ = writeln!(
        out,
        r##"<rect width="{}" height="{}" fill="#16161d"/>"##,
        num(cfg.width),
        num(total_height)
    );
    out.push_str("<g id=\"timeline\">\n");
    for e in &frame.timeline.elements {
        write_element(&mut out, e);
    }
    out.push_str("</g>\n");
    let _ = writeln!(out, r#"<g id="treemap" transform="translate(0,{})">"#, num(cfg.timeline_height));
    for e in &frame.treemap.elements {
        write_element(&mut out, e);
    }
    out.push_str("</g>\n</svg>\n");
    out
}

fn write_element(out: &mut String, e: &Element) {
    let id = e.key.dom_id();
    let _ = match &e.attrs {
        Attrs::Rect(a) => writeln!(
            out,
            r#"<rect id="{id}" x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="{}" stroke-width="{}" opacity="{}"/>"#,
            num(a.x),
            num(a.y),
            num(a.width),
            num(a.height),
            a.fill.map(|c| c.hex()).unwrap_or_else(|| "none".into()),
            a.stroke.hex(),
            num(a.stroke_width),
            num(a.opacity),
        ),
        Attrs::Text(a) => writeln!(
            out,
            r#"<text id="{id}" x="{}" y="{}" text-anchor="middle" font-size="{}px" font-weight="{}" fill="{}" opacity="{}"{}>{}</text>"#,
            num(a.x),
            num(a.y),
            num(a.font_size),
            if a.bold { 700 } else { 400 },
            a.fill.hex(),
            num(a.opacity),
            if a.visible { "" } else { r#" visibility="hidden""# },
            escape(&a.text),
        ),
        Attrs::Circle(a) => writeln!(
            out,
            r#"<circle id="{id}" cx="{}" cy="{}" r="{}" fill="{}" stroke="{}" stroke-width="{}" opacity="{}"/>"#,
            num(a.cx),
            num(a.cy),
            num(a.r),
            a.fill.map(|c| c.hex()).unwrap_or_else(|| "none".into()),
            a.stroke.hex(),
            num(a.stroke_width),
            num(a.opacity),
        ),
        Attrs::Line(a) => writeln!(
            out,
            r#"<line id="{id}" x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}" opacity="{}"/>"#,
            num(a.x1),
            num(a.y1),
            num(a.x2),
            num(a.y2),
            a.stroke.hex(),
            num(a.stroke_width),
            num(a.opacity),
        ),
        Attrs::Path(a) => {
            let mut d = String::new();
            for segment in a.segments() {
                for (i, p) in segment.iter().enumerate() {
                    let _ = write!(d, "{}{} {} ", if i == 0 { 'M' } else { 'L' }, num(p.x), num(p.y));
                }
            }
            writeln!(
                out,
                r#"<path id="{id}" d="{}" fill="none" stroke="{}" stroke-width="{}" opacity="{}"/>"#,
                d.trim_end(),
                a.stroke.hex(),
                num(a.stroke_width),
                num(a.opacity),
            )
        }
    };
}

fn num(v: f64) -> String {
    let r = (v * 100.0).round() / 100.0;
    if r == 0.0 {
        "0".to_string()
    } else {
        r.to_string()
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
