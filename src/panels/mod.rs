mod central_panel;
mod tools_panel;

pub use central_panel::{central_panel, CanvasView};
pub use tools_panel::{tools_panel, EditorAction};

use crate::error::DrawingResult;

/// UI handlers have nowhere to return errors to; log them instead.
pub(crate) fn report(what: &str, result: DrawingResult<impl Sized>) {
    if let Err(err) = result {
        log::error!("{what} failed: {err}");
    }
}
