use eframe::egui::{self, Key, KeyboardShortcut, Modifiers, PointerButton, Pos2, Rect};

use super::report;
use crate::renderer::{CanvasTransform, Renderer};
use crate::session::DrawingSession;

const UNDO: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::Z);
const REDO: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND.plus(Modifiers::SHIFT), Key::Z);
const REDO_ALT: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::Y);

/// Per-editor canvas widget state
#[derive(Debug, Default)]
pub struct CanvasView {
    renderer: Renderer,
    /// Origin of the text box that has already been given keyboard focus
    focused_text: Option<Pos2>,
}

impl CanvasView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, ui: &mut egui::Ui, session: &mut DrawingSession) {
        let available = ui.available_size();
        let ppp = ui.ctx().pixels_per_point();
        if !session.is_busy() && !session.state().is_dragging() {
            session.set_scale(ppp);
            let width = (available.x * ppp).round() as i64;
            let height = (available.y * ppp).round() as i64;
            if width > 0 && height > 0 {
                report("Resize", session.resize(width, height));
            }
        }

        let (response, painter) = ui.allocate_painter(available, egui::Sense::click_and_drag());
        let transform = CanvasTransform::new(response.rect, session.surface());

        if !session.is_busy() {
            self.handle_pointer(ui, &response, transform, session);
            if session.text_input().is_none() {
                handle_shortcuts(ui, session);
            }
        }

        self.renderer.render(ui.ctx(), &painter, transform, session);
        self.text_overlay(ui, transform, session);
    }

    fn handle_pointer(
        &mut self,
        ui: &egui::Ui,
        response: &egui::Response,
        transform: CanvasTransform,
        session: &mut DrawingSession,
    ) {
        let pointer = response.interact_pointer_pos();

        if response.drag_started_by(PointerButton::Primary) {
            // the drag is only recognized after some movement; start where the press was
            let origin = ui.input(|i| i.pointer.press_origin()).or(pointer);
            if let Some(origin) = origin {
                report("Pointer press", session.begin_gesture(transform.to_surface(origin)));
            }
        }

        if response.dragged_by(PointerButton::Primary) && session.state().is_dragging() {
            if !response.contains_pointer() {
                report("Pointer leave", session.pointer_left());
            } else if let Some(pos) = pointer {
                report("Pointer move", session.move_gesture(transform.to_surface(pos)));
            }
        }

        if response.drag_stopped() {
            report("Pointer release", session.end_gesture());
        }

        if response.clicked() {
            if let Some(pos) = pointer {
                let point = transform.to_surface(pos);
                report("Pointer press", session.begin_gesture(point));
                report("Pointer release", session.end_gesture());
            }
        }
    }

    /// Inline editor for the text tool, placed where the user clicked.
    ///
    /// Enter or focus loss commits, Escape discards.
    fn text_overlay(&mut self, ui: &mut egui::Ui, transform: CanvasTransform, session: &mut DrawingSession) {
        let Some(origin) = session.state().text_overlay().map(|overlay| overlay.origin) else {
            self.focused_text = None;
            return;
        };
        let font_size = session.settings().font_size / transform.scale;
        let [r, g, b, a] = session.settings().color;
        let color = egui::Color32::from_rgba_unmultiplied(r, g, b, a);
        let rect = Rect::from_min_size(
            transform.to_screen(origin),
            egui::vec2(240.0, font_size + 8.0),
        );
        let id = ui.make_persistent_id(("text_overlay", origin.x.to_bits(), origin.y.to_bits()));

        let Some(text) = session.text_input_mut() else {
            return;
        };
        let response = ui.put(
            rect,
            egui::TextEdit::singleline(text)
                .id(id)
                .font(egui::FontId::proportional(font_size))
                .text_color(color)
                .hint_text("Type, then Enter"),
        );

        if self.focused_text != Some(origin) {
            response.request_focus();
            self.focused_text = Some(origin);
        }

        if ui.input(|i| i.key_pressed(Key::Escape)) {
            session.cancel_text();
            self.focused_text = None;
        } else if response.lost_focus() {
            report("Text commit", session.commit_text());
            self.focused_text = None;
        }
    }
}

fn handle_shortcuts(ui: &mut egui::Ui, session: &mut DrawingSession) {
    // shift variant first: COMMAND+Z would also match COMMAND+SHIFT+Z
    let redo = ui.input_mut(|i| i.consume_shortcut(&REDO) || i.consume_shortcut(&REDO_ALT));
    if redo {
        report("Redo", session.redo());
    } else if ui.input_mut(|i| i.consume_shortcut(&UNDO)) {
        report("Undo", session.undo());
    }
}

pub fn central_panel(ctx: &egui::Context, session: &mut DrawingSession, view: &mut CanvasView) {
    egui::CentralPanel::default()
        .frame(egui::Frame::none())
        .show(ctx, |ui| view.show(ui, session));
}
