//! egui application shell wiring the annotation engine to input and paint.

use crate::geometry::{CoordinateMapper, ImageLayout, OriginalImageSize};
use crate::gesture::{pick_color, GestureTracker, PALETTE};
use crate::labels::LabelAssigner;
use crate::store::{BoundingBox, BoxStore};
use crate::submit::{prepare_metadata, HttpSubmitter, SubmitError, Submitter};
use eframe::egui;
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};

const BOX_STROKE_WIDTH: f32 = 3.0;

fn hex_color(hex: &str) -> egui::Color32 {
    let h = hex.trim_start_matches('#');
    if h.len() == 6 {
        if let (Ok(r), Ok(g), Ok(b)) = (
            u8::from_str_radix(&h[0..2], 16),
            u8::from_str_radix(&h[2..4], 16),
            u8::from_str_radix(&h[4..6], 16),
        ) {
            return egui::Color32::from_rgb(r, g, b);
        }
    }
    egui::Color32::RED
}

pub struct LabelApp {
    image_path: PathBuf,
    image_bytes: Vec<u8>,
    raw_image: Option<DynamicImage>,
    texture: Option<egui::TextureHandle>,
    original_size: Option<OriginalImageSize>,
    layout: Option<ImageLayout>,

    store: BoxStore,
    tracker: GestureTracker,
    assigner: LabelAssigner,
    label_input: String,
    classes: Vec<String>,

    submitter: HttpSubmitter,
    submitting: bool,
    pending: Option<Receiver<Result<usize, SubmitError>>>,
    status: String,
}

impl LabelApp {
    pub fn new(image_path: PathBuf, classes: Vec<String>, endpoint: String) -> Self {
        let image_bytes = std::fs::read(&image_path).unwrap_or_default();
        let raw_image = image::load_from_memory(&image_bytes).ok();
        let original_size = raw_image.as_ref().map(|img| OriginalImageSize {
            width: img.width(),
            height: img.height(),
        });
        let status = match &original_size {
            Some(size) => {
                log::info!(
                    "loaded {} ({}x{})",
                    image_path.display(),
                    size.width,
                    size.height
                );
                "Drag on the image to draw a box".to_string()
            }
            None => format!("Failed to decode {}", image_path.display()),
        };

        Self {
            image_path,
            image_bytes,
            raw_image,
            texture: None,
            original_size,
            layout: None,
            store: BoxStore::new(),
            tracker: GestureTracker::new(),
            assigner: LabelAssigner::new(),
            label_input: String::new(),
            classes,
            submitter: HttpSubmitter::new(endpoint),
            submitting: false,
            pending: None,
            status,
        }
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_some() {
            return;
        }
        if let Some(ref img) = self.raw_image {
            let rgba = img.to_rgba8();
            let size = [rgba.width() as usize, rgba.height() as usize];
            let pixels = rgba.as_flat_samples();
            let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
            self.texture =
                Some(ctx.load_texture("image", color_image, egui::TextureOptions::LINEAR));
        }
    }

    /// Aspect-preserving "contain" fit of the image inside the canvas. The
    /// fitted rect is the image layout the coordinate mapper scales from.
    fn fit_rect(&self, canvas_rect: egui::Rect) -> Option<egui::Rect> {
        let size = self.original_size?;
        let (img_w, img_h) = (size.width as f32, size.height as f32);
        let scale = (canvas_rect.width() / img_w).min(canvas_rect.height() / img_h);
        let fitted = egui::vec2(img_w * scale, img_h * scale);
        Some(egui::Rect::from_center_size(canvas_rect.center(), fitted))
    }

    fn draw_box(&self, painter: &egui::Painter, origin: egui::Pos2, bbox: &BoundingBox) {
        let rect = egui::Rect::from_two_pos(
            origin + egui::vec2(bbox.x1, bbox.y1),
            origin + egui::vec2(bbox.x2, bbox.y2),
        );
        let color = hex_color(&bbox.color);
        painter.rect_stroke(
            rect,
            0.0,
            egui::Stroke::new(BOX_STROKE_WIDTH, color),
            egui::StrokeKind::Middle,
        );

        if !bbox.label.is_empty() {
            let galley = painter.layout_no_wrap(
                bbox.label.clone(),
                egui::FontId::proportional(12.0),
                egui::Color32::WHITE,
            );
            let tag_size = galley.size() + egui::vec2(8.0, 4.0);
            let tag_pos = rect.left_top() - egui::vec2(0.0, tag_size.y + 2.0);
            painter.rect_filled(egui::Rect::from_min_size(tag_pos, tag_size), 3.0, color);
            painter.galley(tag_pos + egui::vec2(4.0, 2.0), galley, egui::Color32::WHITE);
        }
    }

    fn handle_drag(
        &mut self,
        ctx: &egui::Context,
        response: &egui::Response,
        fit_rect: egui::Rect,
    ) {
        if response.drag_started_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.hover_pos() {
                if fit_rect.contains(pos) {
                    let rel = pos - fit_rect.min;
                    let color = pick_color(&PALETTE, &mut rand::thread_rng());
                    self.tracker.pointer_down(rel.x, rel.y, color);
                }
            }
        }

        if response.dragged_by(egui::PointerButton::Primary) {
            if let Some(pos) = response.hover_pos() {
                let rel = pos - fit_rect.min;
                self.tracker.pointer_move(rel.x, rel.y);
            }
        }

        if response.drag_stopped_by(egui::PointerButton::Primary) {
            if let Some(pos) = response
                .hover_pos()
                .or(ctx.input(|i| i.pointer.latest_pos()))
            {
                let rel = pos - fit_rect.min;
                self.tracker.pointer_move(rel.x, rel.y);
            }
            if let Some(bbox) = self.tracker.pointer_up() {
                log::info!(
                    "committed box {} at ({:.0},{:.0})-({:.0},{:.0})",
                    bbox.id,
                    bbox.x1,
                    bbox.y1,
                    bbox.x2,
                    bbox.y2
                );
                self.store.add(bbox);
            }
        }
    }

    fn label_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Add label");

        if !self.classes.is_empty() {
            ui.label("Select existing class:");
            ui.horizontal_wrapped(|ui| {
                for class in self.classes.clone() {
                    let selected = self.assigner.selected_class() == Some(class.as_str());
                    if ui.selectable_label(selected, &class).clicked() {
                        self.assigner.select_class(&class);
                        self.label_input.clear();
                    }
                }
            });
        }

        ui.label("Or enter new class name:");
        if ui.text_edit_singleline(&mut self.label_input).changed() {
            self.assigner.set_free_text(&self.label_input);
        }

        ui.separator();
        ui.heading(format!("Bounding boxes ({})", self.store.len()));

        let mut to_label: Option<u64> = None;
        let mut to_remove: Option<u64> = None;
        let rows: Vec<(u64, String, String)> = self
            .store
            .boxes()
            .iter()
            .map(|b| (b.id, b.label.clone(), b.color.clone()))
            .collect();

        for (i, (id, label, color)) in rows.iter().enumerate() {
            ui.horizontal(|ui| {
                let (swatch, _) =
                    ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
                ui.painter().rect_filled(swatch, 7.0, hex_color(color));

                if label.is_empty() {
                    ui.label(format!("Box {}: unlabeled", i + 1));
                    if ui.button("Add label").clicked() {
                        to_label = Some(*id);
                    }
                } else {
                    ui.label(format!("Box {}: {}", i + 1, label));
                }
                if ui.button("✕").clicked() {
                    to_remove = Some(*id);
                }
            });
        }

        if let Some(id) = to_label {
            match self.assigner.apply(&mut self.store, id) {
                Ok(label) => {
                    self.label_input.clear();
                    self.status = format!("Labeled box as \"{label}\"");
                }
                Err(e) => self.status = e.to_string(),
            }
        }
        if let Some(id) = to_remove {
            self.store.remove(id);
            log::debug!("removed box {id}");
            self.status = "Box removed".to_string();
        }

        ui.separator();
        if ui
            .add_enabled(self.can_submit(), egui::Button::new("Submit"))
            .clicked()
        {
            self.submit();
        }
        if self.submitting {
            ui.spinner();
        }
        ui.label(&self.status);
    }

    /// Submit stays disabled while a submission is in flight, while the
    /// store is empty, and until both readiness inputs have resolved.
    fn can_submit(&self) -> bool {
        !self.submitting
            && !self.store.is_empty()
            && CoordinateMapper::resolve(self.layout, self.original_size).is_ok()
    }

    /// Snapshots the payload synchronously, then uploads on a background
    /// thread so a slow POST cannot freeze the UI. A single submission may
    /// be in flight at a time; there is no cancellation.
    fn submit(&mut self) {
        let metadata = match prepare_metadata(&self.store, self.layout, self.original_size) {
            Ok(metadata) => metadata,
            Err(e) => {
                self.status = e.to_string();
                log::warn!("submission rejected: {e}");
                return;
            }
        };

        let submitted = self.store.len();
        let image = self.image_bytes.clone();
        let submitter = self.submitter.clone();
        let (tx, rx) = channel();
        std::thread::spawn(move || {
            let _ = tx.send(submitter.submit(&image, &metadata).map(|_| submitted));
        });

        self.pending = Some(rx);
        self.submitting = true;
        self.status = "Submitting labeling data…".to_string();
        log::info!("uploading {submitted} box(es)");
    }

    /// Collects the outcome of an in-flight submission. Success clears the
    /// session; failure keeps every box and label for retry.
    fn poll_pending(&mut self, ctx: &egui::Context) {
        let Some(rx) = &self.pending else {
            return;
        };
        match rx.try_recv() {
            Ok(Ok(n)) => {
                self.pending = None;
                self.submitting = false;
                self.store.clear();
                self.status = format!("Submitted {n} box(es); the model will be retrained");
                log::info!("submission of {n} box(es) accepted");
            }
            Ok(Err(e)) => {
                self.pending = None;
                self.submitting = false;
                self.status = e.to_string();
                log::warn!("submission failed: {e}");
            }
            Err(TryRecvError::Empty) => {
                ctx.request_repaint();
            }
            Err(TryRecvError::Disconnected) => {
                self.pending = None;
                self.submitting = false;
                self.status = "Upload thread exited unexpectedly".to_string();
            }
        }
    }

    /// Records this frame's fitted rect. When the image is re-laid-out at a
    /// new size (window resize), committed boxes are rescaled so they stay
    /// anchored to the same image pixels under the new layout.
    fn update_layout(&mut self, new_layout: ImageLayout) {
        if let Some(old) = self.layout {
            let resized = (old.width - new_layout.width).abs() > 0.5
                || (old.height - new_layout.height).abs() > 0.5;
            if resized && old.width > 0.0 && old.height > 0.0 {
                self.store
                    .rescale(new_layout.width / old.width, new_layout.height / old.height);
            }
        }
        self.layout = Some(new_layout);
    }
}

impl eframe::App for LabelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_texture(ctx);
        self.poll_pending(ctx);

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Image labeling");
                ui.separator();
                ui.label("Tap and drag to create bounding boxes around objects");
                ui.separator();
                ui.label(
                    self.image_path
                        .file_name()
                        .and_then(|f| f.to_str())
                        .unwrap_or("?"),
                );
            });
        });

        egui::SidePanel::right("labels")
            .min_width(260.0)
            .show(ctx, |ui| self.label_panel(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            let (response, painter) =
                ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
            let canvas_rect = response.rect;

            painter.rect_filled(canvas_rect, 0.0, egui::Color32::from_gray(40));

            let Some(fit_rect) = self.fit_rect(canvas_rect) else {
                painter.text(
                    canvas_rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "No image",
                    egui::FontId::proportional(18.0),
                    egui::Color32::LIGHT_GRAY,
                );
                return;
            };

            if let Some(ref tex) = self.texture {
                painter.image(
                    tex.id(),
                    fit_rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }

            // The fitted rect is this frame's layout; the mapper reads it
            // at submission time.
            self.update_layout(ImageLayout {
                x: fit_rect.min.x,
                y: fit_rect.min.y,
                width: fit_rect.width(),
                height: fit_rect.height(),
            });

            self.handle_drag(ctx, &response, fit_rect);

            for bbox in self.store.boxes() {
                self.draw_box(&painter, fit_rect.min, bbox);
            }
            if let Some(preview) = self.tracker.current_box() {
                self.draw_box(&painter, fit_rect.min, preview);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headless_app() -> LabelApp {
        LabelApp::new(
            PathBuf::from("/nonexistent/image.jpg"),
            Vec::new(),
            "http://localhost:9".to_string(),
        )
    }

    fn bbox(id: u64, corners: (f32, f32, f32, f32)) -> BoundingBox {
        BoundingBox {
            id,
            x1: corners.0,
            y1: corners.1,
            x2: corners.2,
            y2: corners.3,
            label: "apple".to_string(),
            color: "#A8E6CF".to_string(),
        }
    }

    fn layout(w: f32, h: f32) -> ImageLayout {
        ImageLayout {
            x: 0.0,
            y: 0.0,
            width: w,
            height: h,
        }
    }

    #[test]
    fn submit_disabled_until_boxes_and_readiness() {
        let mut app = headless_app();
        assert!(!app.can_submit(), "empty store");

        app.store.add(bbox(1, (50.0, 50.0, 150.0, 150.0)));
        assert!(!app.can_submit(), "layout and original size unresolved");

        app.layout = Some(layout(300.0, 300.0));
        assert!(!app.can_submit(), "original size unresolved");

        app.original_size = Some(OriginalImageSize {
            width: 900,
            height: 900,
        });
        assert!(app.can_submit());

        app.submitting = true;
        assert!(!app.can_submit(), "one submission in flight at a time");
    }

    #[test]
    fn resize_rescales_committed_boxes() {
        let mut app = headless_app();
        app.update_layout(layout(300.0, 300.0));
        app.store.add(bbox(1, (50.0, 50.0, 150.0, 150.0)));

        // Wider and shorter after a window resize.
        app.update_layout(layout(600.0, 150.0));
        let b = &app.store.boxes()[0];
        assert_eq!((b.x1, b.y1, b.x2, b.y2), (100.0, 25.0, 300.0, 75.0));
        assert_eq!(app.layout, Some(layout(600.0, 150.0)));
    }

    #[test]
    fn moving_the_window_does_not_rescale() {
        let mut app = headless_app();
        app.update_layout(layout(300.0, 300.0));
        app.store.add(bbox(1, (50.0, 50.0, 150.0, 150.0)));

        // Same size at a new screen position.
        app.update_layout(ImageLayout {
            x: 40.0,
            y: 80.0,
            width: 300.0,
            height: 300.0,
        });
        let b = &app.store.boxes()[0];
        assert_eq!((b.x1, b.y1, b.x2, b.y2), (50.0, 50.0, 150.0, 150.0));
    }
}
