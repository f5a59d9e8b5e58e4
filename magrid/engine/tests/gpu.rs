use magrid_engine::backend::AnyBuffer;
use magrid_engine::{range, AnyBackend, Axis, GpuBytes, HostBackend, RegionError, ResidentBackend, Session, Shape, Vec3};

fn gpu() -> Option<GpuBytes> {
    match GpuBytes::blocking() {
        Ok(g) => Some(g),
        Err(e) => {
            eprintln!("skipping GPU test: {e}");
            None
        }
    }
}

fn snapshot<B: ResidentBackend>(s: &Session<B>) -> Vec<u8> {
    let mesh = *s.mesh().unwrap();
    s.regions().host_mirror(&mesh).unwrap().into_cells()
}

fn scripted<B: ResidentBackend>(backend: B) -> Session<B> {
    let mut s = Session::new(backend);
    // Odd counts so the last packed word is partial.
    s.set_mesh([7, 5, 3], [1.0; 3]).unwrap();
    s.define_region(1, Shape::ellipsoid(6.0, 4.0, 8.0).translate(Vec3::new(3.5, 2.5, 1.5))).unwrap();
    s.define_region(2, range(Axis::X, 5.0, 6.0)).unwrap();
    s.define_cell(9, 6, 4, 2).unwrap();
    s.define_cell(8, 1, 0, 0).unwrap();
    s
}

#[test]
fn gpu_matches_host() {
    let Some(g) = gpu() else { return };
    let mut dev = scripted(g);
    let mut host = scripted(HostBackend);
    assert_eq!(snapshot(&dev), snapshot(&host));

    for (axis, dx) in [(Axis::X, 2), (Axis::Y, -1), (Axis::Z, 1), (Axis::X, -9), (Axis::Z, -2)] {
        let a = dev.shift(axis, dx).unwrap();
        let b = host.shift(axis, dx).unwrap();
        assert_eq!(a, b);
        assert_eq!(snapshot(&dev), snapshot(&host), "after shift {axis:?} {dx}");
    }

    dev.set_mesh([9, 4, 2], [1.0; 3]).unwrap();
    host.set_mesh([9, 4, 2], [1.0; 3]).unwrap();
    assert_eq!(snapshot(&dev), snapshot(&host));
    assert_eq!(dev.get_cell(8, 3, 1).unwrap(), host.get_cell(8, 3, 1).unwrap());
    assert_eq!(dev.field().unwrap(), host.field().unwrap());
}

#[test]
fn gpu_byte_primitives() {
    let Some(g) = gpu() else { return };
    let mut buf = g.allocate(10).unwrap();
    g.fill(&mut buf, 3).unwrap();
    assert_eq!(g.download(&buf).unwrap(), vec![3; 10]);

    let bytes: Vec<u8> = (1..=10).collect();
    g.upload(&bytes, &mut buf).unwrap();
    g.write_byte(&mut buf, 9, 200).unwrap();
    assert_eq!(g.read_byte(&buf, 9).unwrap(), 200);
    assert_eq!(g.read_byte(&buf, 4).unwrap(), 5);
    assert!(g.write_byte(&mut buf, 10, 1).is_err());
    assert!(g.upload(&bytes[..9], &mut buf).is_err());

    let mut dst = g.allocate(10).unwrap();
    g.shift_window(&mut dst, &buf, [5, 2, 1], Axis::X, 1, 0).unwrap();
    assert_eq!(g.download(&dst).unwrap(), vec![0, 1, 2, 3, 4, 0, 6, 7, 8, 9]);
    g.release(dst);
    g.release(buf);
}

#[test]
fn foreign_buffers_are_rejected() {
    let Some(g) = gpu() else { return };
    let foreign = AnyBuffer::Gpu(g.allocate(4).unwrap());
    let host = AnyBackend::Host(HostBackend);
    let mut buf = foreign;
    assert!(matches!(host.fill(&mut buf, 1), Err(RegionError::BackendMismatch("host"))));
    assert!(matches!(host.download(&buf), Err(RegionError::BackendMismatch("host"))));
    assert_eq!(host.buffer_len(&buf), 4);
    // Releasing through the wrong backend still frees the buffer, with a warning.
    host.release(buf);
}
