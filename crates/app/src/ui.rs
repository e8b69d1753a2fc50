use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rounding, Sense, Shape, Stroke, Ui, Vec2};
use treetrend_core::color::Color;
use treetrend_core::scene::{Attrs, Element, ElementKey, Surface};
use treetrend_core::LoadMsg;

use crate::state::AppState;

pub fn draw(app: &mut AppState, ctx: &egui::Context) {
    poll_load(app, ctx);
    app.pump_selection();

    // Keep repainting while loading or animating
    if app.load_rx.is_some() || app.is_animating() {
        ctx.request_repaint();
    }

    egui::TopBottomPanel::top("top").show(ctx, |ui| {
        top_bar(ui, app);
    });

    if !app.issues.is_empty() {
        egui::TopBottomPanel::bottom("issues")
            .resizable(true)
            .default_height(80.0)
            .show(ctx, |ui| {
                ui.label(format!("{} records skipped", app.issues.len()));
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for issue in &app.issues {
                        ui.small(issue);
                    }
                });
            });
    }

    egui::CentralPanel::default().show(ctx, |ui| {
        if app.controller.time_points().is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label(app.status.as_deref().unwrap_or("No data. Open a dataset to start."));
            });
            return;
        }
        egui::ScrollArea::both().show(ui, |ui| {
            let cfg = app.controller.config().clone();
            surface(ui, app, Surface::Timeline, Vec2::new(cfg.width as f32, cfg.timeline_height as f32));
            surface(ui, app, Surface::Treemap, Vec2::new(cfg.width as f32, cfg.height as f32));
        });
    });
}

fn top_bar(ui: &mut Ui, app: &mut AppState) {
    ui.horizontal(|ui| {
        if ui.button("Open Dataset").clicked() {
            if let Some(path) = rfd::FileDialog::new().add_filter("JSON", &["json"]).pick_file() {
                app.start_load(path);
            }
        }
        if app.load_rx.is_some() {
            if ui.button("Cancel").clicked() {
                app.cancel_load();
            }
            let progress = if app.progress_total > 0 {
                app.progress_parsed as f32 / app.progress_total as f32
            } else {
                0.0
            };
            ui.add(egui::ProgressBar::new(progress).desired_width(160.0).text("Loading…"));
        }
        ui.separator();
        let n = app.controller.time_points().len();
        if let Some(i) = app.controller.current_index() {
            let label = &app.controller.time_points()[i].label;
            ui.label(format!("{label}  ({} / {n})", i + 1));
            if ui.add_enabled(i > 0, egui::Button::new("◀")).clicked() {
                let _ = app.controller.sender().send(treetrend_core::scene::IndexChanged(i - 1));
            }
            if ui.add_enabled(i + 1 < n, egui::Button::new("▶")).clicked() {
                let _ = app.controller.sender().send(treetrend_core::scene::IndexChanged(i + 1));
            }
        }
        if let Some(source) = &app.source {
            ui.separator();
            ui.label(source.display().to_string());
        }
    });
}

fn surface(ui: &mut Ui, app: &mut AppState, which: Surface, size: Vec2) {
    let (response, painter) = ui.allocate_painter(size, Sense::click());
    let origin = response.rect.min;
    let now = app.now_ms();
    let elements = app.player(which).sample(now);

    if which == Surface::Treemap {
        app.hovered = response.hover_pos().and_then(|pos| {
            let local = pos - origin;
            elements
                .iter()
                .rev()
                .filter(|e| matches!(e.key, ElementKey::SparkMarker(..)))
                .find(|e| e.attrs.contains(local.x as f64, local.y as f64))
                .and_then(|e| e.key.item().cloned())
        });
    }

    for element in &elements {
        paint(&painter, origin, element, app.hovered.as_ref());
    }

    if response.clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            let local = pos - origin;
            app.controller.click(which, local.x as f64, local.y as f64);
        }
    }
}

fn color32(c: Color, opacity: f64) -> Color32 {
    Color32::from_rgba_unmultiplied(c.r, c.g, c.b, (opacity.clamp(0.0, 1.0) * 255.0) as u8)
}

fn at(origin: Pos2, x: f64, y: f64) -> Pos2 {
    origin + Vec2::new(x as f32, y as f32)
}

fn paint(painter: &egui::Painter, origin: Pos2, element: &Element, hovered: Option<&treetrend_core::ItemKey>) {
    match &element.attrs {
        Attrs::Rect(a) => {
            let rect = egui::Rect::from_min_size(at(origin, a.x, a.y), Vec2::new(a.width as f32, a.height as f32));
            if let Some(fill) = a.fill {
                painter.rect_filled(rect, Rounding::ZERO, color32(fill, a.opacity));
            }
            painter.rect_stroke(
                rect,
                Rounding::ZERO,
                Stroke::new(a.stroke_width as f32, color32(a.stroke, a.opacity)),
            );
        }
        Attrs::Text(a) => {
            let revealed = matches!(&element.key, ElementKey::LeafLabel(k) if Some(k) == hovered);
            if !(a.visible || revealed) || a.font_size < 1.0 {
                return;
            }
            let opacity = if revealed { 1.0 } else { a.opacity };
            let font = if a.bold {
                FontId::proportional(a.font_size as f32 + 1.0)
            } else {
                FontId::proportional(a.font_size as f32)
            };
            painter.text(at(origin, a.x, a.y), Align2::CENTER_BOTTOM, &a.text, font, color32(a.fill, opacity));
        }
        Attrs::Circle(a) => {
            painter.circle(
                at(origin, a.cx, a.cy),
                a.r as f32,
                a.fill.map(|c| color32(c, a.opacity)).unwrap_or(Color32::TRANSPARENT),
                Stroke::new(a.stroke_width as f32, color32(a.stroke, a.opacity)),
            );
        }
        Attrs::Line(a) => {
            painter.line_segment(
                [at(origin, a.x1, a.y1), at(origin, a.x2, a.y2)],
                Stroke::new(a.stroke_width as f32, color32(a.stroke, a.opacity)),
            );
        }
        Attrs::Path(a) => {
            let stroke = Stroke::new(a.stroke_width as f32, color32(a.stroke, a.opacity));
            for segment in a.segments() {
                let points: Vec<Pos2> = segment.iter().map(|p| at(origin, p.x, p.y)).collect();
                painter.add(Shape::line(points, stroke));
            }
        }
    }
}

fn poll_load(app: &mut AppState, ctx: &egui::Context) {
    // Take ownership of the receiver to avoid borrowing while we might assign to it.
    let Some(rx) = app.load_rx.take() else { return; };
    let mut had_msg = false;
    let mut finished = false;
    while let Ok(msg) = rx.try_recv() {
        had_msg = true;
        match msg {
            LoadMsg::Progress { parsed, total } => {
                app.progress_parsed = parsed;
                app.progress_total = total;
            }
            LoadMsg::Issue(issue) => app.issues.push(issue.to_string()),
            LoadMsg::Done(dataset) => {
                let frame = app.controller.load(dataset.time_points);
                app.show(frame);
                finished = true;
                break;
            }
            LoadMsg::Error(e) => {
                app.status = Some(format!("No data: {e}"));
                finished = true;
                break;
            }
        }
    }
    if !finished {
        // Put the receiver back to keep polling next frame
        app.load_rx = Some(rx);
    }
    if had_msg {
        ctx.request_repaint();
    }
}
