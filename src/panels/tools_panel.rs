use eframe::egui;

use super::report;
use crate::components::ToolButton;
use crate::session::DrawingSession;
use crate::tools::{BrushSettings, Tool};

/// Requests from the tools panel that need the app, not just the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    Save,
    /// Reload the last saved version of this drawing
    Revert,
    Close,
}

pub fn tools_panel(ctx: &egui::Context, session: &mut DrawingSession, title: &mut String) -> Option<EditorAction> {
    let mut action = None;
    let busy = session.is_busy();

    egui::SidePanel::left("tools_panel")
        .resizable(true)
        .default_width(200.0)
        .show(ctx, |ui| {
            ui.heading("Tools");

            ui.add_enabled_ui(!busy, |ui| {
                ui.horizontal_wrapped(|ui| {
                    for tool in Tool::ALL {
                        let selected = session.tool() == tool;
                        if ToolButton::new(tool, selected).show(ui).clicked() && !selected {
                            log::info!("Tool selected from UI: {}", tool.name());
                            report("Tool change", session.select_tool(tool));
                        }
                    }
                });
                ui.label(format!("State: {}", session.state().name()));
                ui.separator();

                let mut color = session.settings().color;
                ui.horizontal(|ui| {
                    ui.label("Color:");
                    ui.color_edit_button_srgba_unmultiplied(&mut color);
                });
                if color != session.settings().color {
                    session.set_color(color);
                }

                let mut line_width = session.settings().line_width;
                ui.horizontal(|ui| {
                    ui.label("Thickness:");
                    ui.add(egui::Slider::new(
                        &mut line_width,
                        BrushSettings::MIN_LINE_WIDTH..=BrushSettings::MAX_LINE_WIDTH,
                    ));
                });
                if line_width != session.settings().line_width {
                    session.set_line_width(line_width);
                }

                let mut font_size = session.settings().font_size;
                ui.horizontal(|ui| {
                    ui.label("Font size:");
                    ui.add(egui::Slider::new(&mut font_size, 8.0..=96.0));
                });
                if font_size != session.settings().font_size {
                    session.set_font_size(font_size);
                }
                ui.separator();

                ui.horizontal(|ui| {
                    if ui.add_enabled(session.can_undo(), egui::Button::new("Undo")).clicked() {
                        report("Undo", session.undo());
                    }
                    if ui.add_enabled(session.can_redo(), egui::Button::new("Redo")).clicked() {
                        report("Redo", session.redo());
                    }
                    if ui.button("Clear").clicked() {
                        report("Clear", session.clear());
                    }
                });

                let history = session.history();
                ui.label(format!(
                    "Undo stack: {}/{}  Redo stack: {}",
                    history.undo_len(),
                    history.depth(),
                    history.redo_len()
                ));
            });
            ui.separator();

            ui.horizontal(|ui| {
                ui.label("Title:");
                ui.add_enabled(!busy, egui::TextEdit::singleline(title).hint_text("Drawing"));
            });
            ui.horizontal(|ui| {
                if ui.add_enabled(!busy, egui::Button::new("Save")).clicked() {
                    action = Some(EditorAction::Save);
                }
                let can_revert = !busy && session.note_id().is_some();
                if ui.add_enabled(can_revert, egui::Button::new("Revert")).clicked() {
                    action = Some(EditorAction::Revert);
                }
                if ui.button("Close").clicked() {
                    action = Some(EditorAction::Close);
                }
            });
            if busy {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Working...");
                });
            }
        });

    action
}
