#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use std::path::PathBuf;

use note_sketch::{AppConfig, NoteSketchApp};

/// Overrides where the config file is read from
const CONFIG_ENV: &str = "NOTE_SKETCH_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "note-sketch.json";

fn main() -> eframe::Result {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let config_path = std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = AppConfig::load(&config_path).unwrap_or_else(|err| {
        log::error!("{err}; falling back to defaults");
        AppConfig::default()
    });

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 700.0])
            .with_min_inner_size([400.0, 300.0])
            .with_title("Note Sketch"),
        ..Default::default()
    };
    eframe::run_native(
        "note-sketch",
        native_options,
        Box::new(|cc| Ok(Box::new(NoteSketchApp::new(cc, config)))),
    )
}
