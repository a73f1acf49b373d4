use egui::{Pos2, Rect};
use serde::{Deserialize, Serialize};

/// Outline shapes produced by a press-drag-release gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    Line,
    Rectangle,
    Circle,
}

/// Resolved geometry of a shape between an anchor and an endpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeGeometry {
    Line { from: Pos2, to: Pos2 },
    Rectangle(Rect),
    /// Center is the midpoint of the anchor-endpoint diagonal, radius is half
    /// the diagonal length.
    Circle { center: Pos2, radius: f32 },
}

impl ShapeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Line => "Line",
            Self::Rectangle => "Rectangle",
            Self::Circle => "Circle",
        }
    }

    pub fn geometry(&self, anchor: Pos2, endpoint: Pos2) -> ShapeGeometry {
        match self {
            Self::Line => ShapeGeometry::Line {
                from: anchor,
                to: endpoint,
            },
            // from_two_pos normalizes corners dragged up or to the left
            Self::Rectangle => ShapeGeometry::Rectangle(Rect::from_two_pos(anchor, endpoint)),
            Self::Circle => {
                let width = endpoint.x - anchor.x;
                let height = endpoint.y - anchor.y;
                ShapeGeometry::Circle {
                    center: Pos2::new(anchor.x + width / 2.0, anchor.y + height / 2.0),
                    radius: (width * width + height * height).sqrt() / 2.0,
                }
            }
        }
    }
}

impl ShapeGeometry {
    /// Bounding box of the stroked outline for a pen of `half_width`
    pub fn bounds(&self, half_width: f32) -> Rect {
        let rect = match *self {
            Self::Line { from, to } => Rect::from_two_pos(from, to),
            Self::Rectangle(rect) => rect,
            Self::Circle { center, radius } => {
                Rect::from_center_size(center, egui::vec2(radius * 2.0, radius * 2.0))
            }
        };
        rect.expand(half_width)
    }

    /// True when `p` lies on the outline stroked with a pen of `half_width`
    pub fn covers(&self, p: Pos2, half_width: f32) -> bool {
        match *self {
            Self::Line { from, to } => distance_to_segment(p, from, to) <= half_width,
            Self::Rectangle(rect) => {
                let corners = [
                    rect.left_top(),
                    rect.right_top(),
                    rect.right_bottom(),
                    rect.left_bottom(),
                ];
                (0..4).any(|i| distance_to_segment(p, corners[i], corners[(i + 1) % 4]) <= half_width)
            }
            Self::Circle { center, radius } => (p.distance(center) - radius).abs() <= half_width,
        }
    }
}

/// Shortest distance from `p` to the segment `a`-`b`. A degenerate segment is a point.
pub fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let ap = p - a;
    let t = ((ap.x * ab.x + ap.y * ab.y) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_radius_is_half_the_diagonal() {
        let geometry = ShapeKind::Circle.geometry(Pos2::new(10.0, 10.0), Pos2::new(110.0, 50.0));
        let ShapeGeometry::Circle { center, radius } = geometry else {
            panic!("expected circle, got {geometry:?}");
        };
        assert_eq!(center, Pos2::new(60.0, 30.0));
        let expected = (100.0f32 * 100.0 + 40.0 * 40.0).sqrt() / 2.0;
        assert!((radius - expected).abs() < 1e-4);
        assert!((radius - 53.85).abs() < 0.01);
    }

    #[test]
    fn rectangle_normalizes_corners() {
        let geometry = ShapeKind::Rectangle.geometry(Pos2::new(40.0, 30.0), Pos2::new(10.0, 5.0));
        assert_eq!(
            geometry,
            ShapeGeometry::Rectangle(Rect::from_min_max(Pos2::new(10.0, 5.0), Pos2::new(40.0, 30.0)))
        );
    }

    #[test]
    fn segment_distance() {
        let a = Pos2::new(0.0, 0.0);
        let b = Pos2::new(10.0, 0.0);
        assert_eq!(distance_to_segment(Pos2::new(5.0, 3.0), a, b), 3.0);
        assert_eq!(distance_to_segment(Pos2::new(-4.0, 3.0), a, b), 5.0);
        assert_eq!(distance_to_segment(Pos2::new(3.0, 4.0), a, a), 5.0);
    }

    #[test]
    fn rectangle_interior_is_not_covered() {
        let geometry = ShapeKind::Rectangle.geometry(Pos2::new(0.0, 0.0), Pos2::new(20.0, 20.0));
        assert!(geometry.covers(Pos2::new(0.5, 10.0), 1.0));
        assert!(!geometry.covers(Pos2::new(10.0, 10.0), 1.0));
    }
}
