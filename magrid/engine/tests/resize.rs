use magrid_engine::{range, Axis, HostBackend, RegionId, Session, Shape, Vec3};

fn history(s: &mut Session<HostBackend>) {
    s.define_region(1, Shape::cylinder(4.0, 10.0).translate(Vec3::new(3.0, 3.0, 0.0))).unwrap();
    s.define_region(2, range(Axis::Y, 2.0, 3.0)).unwrap();
    s.define_region(4, Shape::cuboid(2.0, 2.0, 2.0).rotate(Axis::Z, 0.4).translate(Vec3::new(5.0, 1.0, 0.5)))
        .unwrap();
}

fn snapshot(s: &Session<HostBackend>) -> Vec<u8> {
    let mesh = *s.mesh().unwrap();
    s.regions().host_mirror(&mesh).unwrap().into_cells()
}

#[test]
fn replay_matches_direct_definition() {
    let mut resized = Session::new(HostBackend);
    resized.set_mesh([4, 4, 1], [1.0; 3]).unwrap();
    history(&mut resized);
    for size in [[8, 8, 1], [3, 5, 2], [16, 2, 3], [6, 7, 2]] {
        resized.set_mesh(size, [1.0; 3]).unwrap();
    }

    let mut direct = Session::new(HostBackend);
    direct.set_mesh([6, 7, 2], [1.0; 3]).unwrap();
    history(&mut direct);

    assert_eq!(snapshot(&resized), snapshot(&direct));
    assert_eq!(resized.regions().history().len(), 3);
}

#[test]
fn resize_resets_cells_outside_history() {
    let mut s = Session::new(HostBackend);
    s.set_mesh([4, 4, 1], [1.0; 3]).unwrap();
    s.define_region(3, range(Axis::X, 0.0, 1.0)).unwrap();
    s.define_cell(5, 3, 3, 0).unwrap();
    s.set_cell(2, 2, 0, RegionId::from(6)).unwrap();

    s.set_mesh([8, 8, 1], [1.0; 3]).unwrap();
    let cells = snapshot(&s);
    assert_eq!(cells.len(), 64);
    assert!(cells.iter().all(|&b| b == 0 || b == 3));
    assert_eq!(s.volume(RegionId::from(3)).unwrap(), 0.125);
}

#[test]
fn cell_size_change_repaints() {
    let mut s = Session::new(HostBackend);
    s.set_mesh([4, 1, 1], [1.0; 3]).unwrap();
    s.define_region(1, range(Axis::X, 0.0, 2.0)).unwrap();
    assert_eq!(snapshot(&s), vec![1, 1, 0, 0]);

    // Same cell count, coarser cells: the region now covers one cell.
    s.set_mesh([4, 1, 1], [2.0, 1.0, 1.0]).unwrap();
    assert_eq!(snapshot(&s), vec![1, 0, 0, 0]);
}

#[test]
fn resize_keeps_window_offset() {
    let mut s = Session::new(HostBackend);
    s.set_mesh([4, 1, 1], [1.0; 3]).unwrap();
    s.define_region(1, range(Axis::X, 0.0, 2.0)).unwrap();
    s.shift(Axis::X, 1).unwrap();
    assert_eq!(snapshot(&s), vec![0, 1, 1, 0]);

    s.set_mesh([6, 1, 1], [1.0; 3]).unwrap();
    assert_eq!(snapshot(&s), vec![0, 1, 1, 0, 0, 0]);
}

#[test]
fn unchanged_mesh_keeps_overrides() {
    let mut s = Session::new(HostBackend);
    s.set_mesh([4, 4, 1], [1.0; 3]).unwrap();
    s.define_cell(5, 0, 0, 0).unwrap();
    s.set_mesh([4, 4, 1], [1.0; 3]).unwrap();
    assert_eq!(s.get_cell(0, 0, 0).unwrap(), RegionId::from(5));
}
