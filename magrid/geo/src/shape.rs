//! Shape predicates over continuous world coordinates.
//!
//! A [`Shape`] is an owned value: it can be cloned, compared and printed, which
//! lets a definition history be inspected and replayed. Evaluation is pure.

use std::collections::BTreeSet;

use crate::math::{Axis, Vec3};

/// Explicit cell-list mask anchored in world space.
///
/// A point belongs to integer cell `floor(p / cell_size)`. The mask does not
/// follow the mesh window: after a window shift the same world cells stay set.
#[derive(Clone, Debug, PartialEq)]
pub struct CellMask {
    /// Edge lengths of one mask cell.
    pub cell_size: Vec3,
    /// Set cells, as world-anchored integer indices.
    pub cells: BTreeSet<[i64; 3]>,
}

impl CellMask {
    #[must_use]
    pub fn new(cell_size: Vec3) -> Self {
        Self { cell_size, cells: BTreeSet::new() }
    }

    /// Mark the cell with integer index `cell`.
    pub fn insert(&mut self, cell: [i64; 3]) {
        self.cells.insert(cell);
    }

    /// Integer cell holding `p`.
    #[must_use]
    pub fn cell_of(&self, p: Vec3) -> [i64; 3] {
        let q = p.div_elem(self.cell_size);
        [q.x.floor() as i64, q.y.floor() as i64, q.z.floor() as i64]
    }

    #[must_use]
    pub fn contains(&self, p: Vec3) -> bool {
        self.cells.contains(&self.cell_of(p))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Inside/outside predicate `evaluate(x, y, z) -> bool`.
///
/// Analytic shapes are centered on the origin; use [`Shape::translate`] to
/// move them.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// Everything.
    Universe,
    /// Nothing.
    Nothing,
    /// Ellipsoid with the given diameters along x, y, z.
    Ellipsoid { diameter: Vec3 },
    /// Box with the given edge lengths, `-s/2 <= c < s/2` per axis.
    Cuboid { size: Vec3 },
    /// Circular cylinder along z: disc of `diameter` in xy, `|z| <= height/2`.
    Cylinder { diameter: f64, height: f64 },
    /// Slab `min <= c < max` along one axis. Either bound may be infinite.
    Range { axis: Axis, min: f64, max: f64 },
    /// Half space `dot(normal, p) <= offset`.
    HalfSpace { normal: Vec3, offset: f64 },
    /// Explicit set of world cells.
    Cells(CellMask),
    Translate { shape: Box<Shape>, offset: Vec3 },
    /// Stretch by `factor` per axis (components must be non-zero).
    Scale { shape: Box<Shape>, factor: Vec3 },
    /// Rotate counter-clockwise by `angle` radians around `axis`.
    Rotate { shape: Box<Shape>, axis: Axis, angle: f64 },
    /// Infinite repetition with the given period; a zero component disables
    /// repetition along that axis.
    Repeat { shape: Box<Shape>, period: Vec3 },
    Union(Vec<Shape>),
    Intersect(Box<Shape>, Box<Shape>),
    /// Inside `a` but not inside `b`.
    Subtract(Box<Shape>, Box<Shape>),
    Xor(Box<Shape>, Box<Shape>),
    Inverse(Box<Shape>),
}

impl Shape {
    #[must_use]
    pub fn evaluate(&self, x: f64, y: f64, z: f64) -> bool {
        self.contains(Vec3::new(x, y, z))
    }

    #[must_use]
    pub fn contains(&self, p: Vec3) -> bool {
        match self {
            Shape::Universe => true,
            Shape::Nothing => false,
            Shape::Ellipsoid { diameter } => {
                let q = p.div_elem(diameter.mul(0.5));
                q.dot(q) <= 1.0
            }
            Shape::Cuboid { size } => Axis::ALL.iter().all(|&a| {
                let h = 0.5 * size.component(a);
                let c = p.component(a);
                -h <= c && c < h
            }),
            Shape::Cylinder { diameter, height } => {
                let r = 0.5 * diameter;
                p.x * p.x + p.y * p.y <= r * r && p.z.abs() <= 0.5 * height
            }
            Shape::Range { axis, min, max } => {
                let c = p.component(*axis);
                *min <= c && c < *max
            }
            Shape::HalfSpace { normal, offset } => normal.dot(p) <= *offset,
            Shape::Cells(mask) => mask.contains(p),
            Shape::Translate { shape, offset } => shape.contains(p.sub(*offset)),
            Shape::Scale { shape, factor } => shape.contains(p.div_elem(*factor)),
            Shape::Rotate { shape, axis, angle } => shape.contains(rotate(p, *axis, -angle)),
            Shape::Repeat { shape, period } => shape.contains(wrap(p, *period)),
            Shape::Union(parts) => parts.iter().any(|s| s.contains(p)),
            Shape::Intersect(a, b) => a.contains(p) && b.contains(p),
            Shape::Subtract(a, b) => a.contains(p) && !b.contains(p),
            Shape::Xor(a, b) => a.contains(p) != b.contains(p),
            Shape::Inverse(a) => !a.contains(p),
        }
    }

    #[must_use]
    pub fn ellipsoid(dx: f64, dy: f64, dz: f64) -> Self {
        Shape::Ellipsoid { diameter: Vec3::new(dx, dy, dz) }
    }

    #[must_use]
    pub fn cuboid(sx: f64, sy: f64, sz: f64) -> Self {
        Shape::Cuboid { size: Vec3::new(sx, sy, sz) }
    }

    #[must_use]
    pub fn cylinder(diameter: f64, height: f64) -> Self {
        Shape::Cylinder { diameter, height }
    }

    #[must_use]
    pub fn translate(self, offset: Vec3) -> Self {
        Shape::Translate { shape: Box::new(self), offset }
    }

    #[must_use]
    pub fn scale(self, factor: Vec3) -> Self {
        Shape::Scale { shape: Box::new(self), factor }
    }

    #[must_use]
    pub fn rotate(self, axis: Axis, angle: f64) -> Self {
        Shape::Rotate { shape: Box::new(self), axis, angle }
    }

    #[must_use]
    pub fn repeat(self, period: Vec3) -> Self {
        Shape::Repeat { shape: Box::new(self), period }
    }

    /// Union; flattens nested unions so long chains stay shallow.
    #[must_use]
    pub fn union(self, other: Shape) -> Self {
        match self {
            Shape::Union(mut parts) => {
                parts.push(other);
                Shape::Union(parts)
            }
            first => Shape::Union(vec![first, other]),
        }
    }

    #[must_use]
    pub fn intersect(self, other: Shape) -> Self {
        Shape::Intersect(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn subtract(self, other: Shape) -> Self {
        Shape::Subtract(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn xor(self, other: Shape) -> Self {
        Shape::Xor(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn inverse(self) -> Self {
        Shape::Inverse(Box::new(self))
    }
}

fn rotate(p: Vec3, axis: Axis, angle: f64) -> Vec3 {
    let (s, c) = angle.sin_cos();
    match axis {
        Axis::X => Vec3::new(p.x, c * p.y - s * p.z, s * p.y + c * p.z),
        Axis::Y => Vec3::new(c * p.x + s * p.z, p.y, -s * p.x + c * p.z),
        Axis::Z => Vec3::new(c * p.x - s * p.y, s * p.x + c * p.y, p.z),
    }
}

// Fold each component into [-period/2, period/2).
fn wrap(p: Vec3, period: Vec3) -> Vec3 {
    let mut q = p;
    for axis in Axis::ALL {
        let t = period.component(axis);
        if t > 0.0 {
            let c = p.component(axis);
            q = q.with_component(axis, c - t * (c / t + 0.5).floor());
        }
    }
    q
}
