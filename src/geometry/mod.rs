mod shape;

pub use shape::{distance_to_segment, ShapeGeometry, ShapeKind};
