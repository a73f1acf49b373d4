use std::collections::VecDeque;

use egui::Pos2;
use image::Rgba;

use crate::surface::PixelSurface;

/// Recolors the 4-connected region of pixels that exactly match the seed color.
///
/// Colors match only when all four channels are equal. Returns the number of
/// pixels recolored; zero means the surface was not touched, either because
/// the seed lies outside the surface or already has `new_color`.
pub fn flood_fill(surface: &mut PixelSurface, seed: Pos2, new_color: Rgba<u8>) -> usize {
    let seed_x = seed.x.floor() as i64;
    let seed_y = seed.y.floor() as i64;
    let Some(target) = surface.pixel(seed_x, seed_y) else {
        return 0;
    };
    if target == new_color {
        return 0;
    }

    let mut filled = 0;
    let mut queue = VecDeque::from([(seed_x, seed_y)]);
    while let Some((x, y)) = queue.pop_front() {
        // recolored pixels no longer match, which doubles as the visited set
        if surface.pixel(x, y) != Some(target) {
            continue;
        }
        surface.set_pixel(x, y, new_color);
        filled += 1;
        queue.extend([(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)]);
    }

    log::debug!("Flood fill from ({seed_x}, {seed_y}) recolored {filled} pixels");
    filled
}
