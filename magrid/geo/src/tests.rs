use super::*;
use std::f64::consts::FRAC_PI_2;

#[test]
fn x_below_two_is_half_open() {
    let s = range(Axis::X, f64::NEG_INFINITY, 2.0);
    assert!(s.evaluate(1.999, 0.0, 0.0));
    assert!(!s.evaluate(2.0, 0.0, 0.0));
    assert!(s.evaluate(-1.0e30, 5.0, 5.0));
}

#[test]
fn universe_and_nothing() {
    assert!(Shape::Universe.evaluate(1.0e9, -3.0, 0.5));
    assert!(!Shape::Nothing.evaluate(0.0, 0.0, 0.0));
    assert!(Shape::Nothing.inverse().evaluate(0.0, 0.0, 0.0));
}

#[test]
fn ellipsoid_and_cylinder_bounds() {
    let e = Shape::ellipsoid(4.0, 2.0, 2.0);
    assert!(e.evaluate(1.9, 0.0, 0.0));
    assert!(!e.evaluate(0.0, 1.1, 0.0));

    let c = Shape::cylinder(2.0, 1.0);
    assert!(c.evaluate(0.7, 0.7, 0.5));
    assert!(!c.evaluate(0.0, 0.0, 0.6));
    // Circular cross-section: the corner of the bounding square is outside.
    assert!(!c.evaluate(0.8, 0.8, 0.0));
    assert!(c.evaluate(0.0, -1.0, 0.0));
    assert!(Shape::cylinder(2.0, f64::INFINITY).evaluate(0.0, 0.0, 1.0e12));
}

#[test]
fn cuboid_includes_low_face_only() {
    let b = Shape::cuboid(2.0, 2.0, 2.0);
    assert!(b.evaluate(-1.0, -1.0, -1.0));
    assert!(!b.evaluate(1.0, 0.0, 0.0));
}

#[test]
fn translate_then_rotate_quarter_turn() {
    // Bar along +x, rotated a quarter turn around z, points along +y.
    let bar = Shape::cuboid(4.0, 1.0, 1.0).translate(Vec3::new(2.0, 0.0, 0.0));
    assert!(bar.evaluate(3.0, 0.0, 0.0));
    let turned = bar.rotate(Axis::Z, FRAC_PI_2);
    assert!(turned.evaluate(0.0, 3.0, 0.0));
    assert!(!turned.evaluate(3.0, 0.0, 0.0));
}

#[test]
fn scale_stretches() {
    let s = Shape::ellipsoid(2.0, 2.0, 2.0).scale(Vec3::new(3.0, 1.0, 1.0));
    assert!(s.evaluate(2.5, 0.0, 0.0));
    assert!(!s.evaluate(0.0, 1.5, 0.0));
}

#[test]
fn repeat_tiles_along_x_only() {
    let dot = Shape::cuboid(1.0, 1.0, 1.0).repeat(Vec3::new(4.0, 0.0, 0.0));
    assert!(dot.evaluate(8.2, 0.0, 0.0));
    assert!(!dot.evaluate(2.0, 0.0, 0.0));
    assert!(!dot.evaluate(0.0, 4.0, 0.0));
}

#[test]
fn boolean_combinations() {
    let a = range(Axis::X, 0.0, 2.0);
    let b = range(Axis::X, 1.0, 3.0);
    let p = |x: f64| Vec3::new(x, 0.0, 0.0);

    let u = a.clone().union(b.clone());
    assert!(u.contains(p(0.5)) && u.contains(p(2.5)) && !u.contains(p(3.5)));

    let i = a.clone().intersect(b.clone());
    assert!(i.contains(p(1.5)) && !i.contains(p(0.5)));

    let s = a.clone().subtract(b.clone());
    assert!(s.contains(p(0.5)) && !s.contains(p(1.5)));

    let x = a.xor(b);
    assert!(x.contains(p(0.5)) && !x.contains(p(1.5)) && x.contains(p(2.5)));
}

#[test]
fn union_chain_is_flat() {
    let u = Shape::Nothing.union(Shape::Universe).union(Shape::Nothing);
    match u {
        Shape::Union(parts) => assert_eq!(parts.len(), 3),
        other => panic!("expected union, got {other:?}"),
    }
}

#[test]
fn cell_mask_is_world_anchored() {
    let mut m = CellMask::new(Vec3::splat(1.0));
    m.insert([0, 0, 0]);
    m.insert([-1, 2, 0]);
    let s = Shape::Cells(m);
    assert!(s.evaluate(0.5, 0.5, 0.5));
    assert!(s.evaluate(-0.5, 2.5, 0.1));
    assert!(!s.evaluate(1.5, 0.5, 0.5));
}

#[test]
fn evaluation_is_repeatable() {
    let s = Shape::ellipsoid(3.0, 3.0, 3.0).subtract(Shape::cylinder(1.0, 10.0));
    let first: Vec<bool> = (0..50).map(|i| s.evaluate(f64::from(i) * 0.05, 0.3, 0.0)).collect();
    let second: Vec<bool> = (0..50).map(|i| s.evaluate(f64::from(i) * 0.05, 0.3, 0.0)).collect();
    assert_eq!(first, second);
}
