#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]

pub mod shape;
mod math;

pub use math::{Axis, Vec3};
pub use shape::{CellMask, Shape};

/// Shorthand for the predicate `lo <= c < hi` along `axis`.
#[must_use]
pub fn range(axis: Axis, lo: f64, hi: f64) -> Shape {
    Shape::Range { axis, min: lo, max: hi }
}

#[cfg(test)]
mod tests;
