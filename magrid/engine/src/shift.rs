//! Sliding-window helpers: the host reference of the shift primitive and the
//! boundary slab it exposes.

use std::ops::Range;

use magrid_geo::Axis;

use crate::error::{RegionError, Result};
use crate::mesh::{cell_of, flat_index, prod};

/// Outcome of one window shift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShiftStats {
    /// Cells in the exposed boundary slab
    pub exposed: usize,
    /// Exposed cells whose recomputed region was not the background
    pub repainted: usize,
}

/// Indices along the shift axis that enter the window when content moves by `dx`.
///
/// `dx > 0` exposes the low edge `[0, dx)`, `dx < 0` the high edge `[n+dx, n)`.
/// Offsets wider than the window expose all of it.
pub fn dirty_range(n: usize, dx: i64) -> Range<usize> {
    let width = usize::try_from(dx.unsigned_abs()).unwrap_or(usize::MAX).min(n);
    match dx.signum() {
        1 => 0..width,
        -1 => n - width..n,
        _ => 0..0,
    }
}

/// Source index of destination index `i` after a shift by `dx`, or `None` when
/// the cell enters from outside the old window.
pub fn shift_source(i: usize, dx: i64, n: usize) -> Option<usize> {
    let src = i64::try_from(i).ok()?.checked_sub(dx)?;
    usize::try_from(src).ok().filter(|&s| s < n)
}

/// Host reference of the accelerator shift primitive:
/// `dst[.., i, ..] = src[.., i - dx, ..]` along `axis`, `fill` where the source
/// lies outside the window.
pub fn shift_bytes(dst: &mut [u8], src: &[u8], size: [usize; 3], axis: Axis, dx: i64, fill: u8) -> Result<()> {
    let n = prod(size);
    if dst.len() != n || src.len() != n {
        return Err(RegionError::LengthMismatch { len: dst.len().min(src.len()), size });
    }
    let along = size[axis.index()];
    for (i, out) in dst.iter_mut().enumerate() {
        let mut cell = cell_of(i, size);
        *out = match shift_source(cell[axis.index()], dx, along) {
            Some(s) => {
                cell[axis.index()] = s;
                src[flat_index(cell[0], cell[1], cell[2], size)?]
            }
            None => fill,
        };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dirty_range_by_sign() {
        assert_eq!(dirty_range(8, 3), 0..3);
        assert_eq!(dirty_range(8, -3), 5..8);
        assert_eq!(dirty_range(8, 0), 0..0);
        assert_eq!(dirty_range(8, 20), 0..8);
        assert_eq!(dirty_range(8, -20), 0..8);
        assert_eq!(dirty_range(8, i64::MIN), 0..8);
    }

    #[test]
    fn source_index() {
        assert_eq!(shift_source(0, 1, 4), None);
        assert_eq!(shift_source(1, 1, 4), Some(0));
        assert_eq!(shift_source(3, -1, 4), None);
        assert_eq!(shift_source(2, -1, 4), Some(3));
    }

    #[test]
    fn shifts_rows_along_x() -> Result<()> {
        let size = [4, 2, 1];
        let src = [1, 2, 3, 4, 5, 6, 7, 8];
        let mut dst = [0u8; 8];
        shift_bytes(&mut dst, &src, size, Axis::X, 1, 9)?;
        assert_eq!(dst, [9, 1, 2, 3, 9, 5, 6, 7]);
        shift_bytes(&mut dst, &src, size, Axis::X, -2, 0)?;
        assert_eq!(dst, [3, 4, 0, 0, 7, 8, 0, 0]);
        Ok(())
    }

    #[test]
    fn shifts_along_y() -> Result<()> {
        let size = [2, 3, 1];
        let src = [1, 2, 3, 4, 5, 6];
        let mut dst = [0u8; 6];
        shift_bytes(&mut dst, &src, size, Axis::Y, 1, 0)?;
        assert_eq!(dst, [0, 0, 1, 2, 3, 4]);
        Ok(())
    }
}
