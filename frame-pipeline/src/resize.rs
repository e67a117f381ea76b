//! Resampling of decoded planes onto a different grid,
//! such as when the caller's target buffer has other dimensions
//! than the decoded frame.

use crate::sample::{Sample, SampleBuffer};
use std::borrow::Cow;

/// How to resample a frame onto a target grid.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub enum ScalingType {
    /// blend the four nearest samples
    Bilinear,
    /// copy the nearest sample towards the origin
    #[default]
    Replicate,
}

impl std::str::FromStr for ScalingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bilinear" => Ok(ScalingType::Bilinear),
            "replicate" => Ok(ScalingType::Replicate),
            _ => Err(format!("unknown scaling type `{}`", s)),
        }
    }
}

/// An immutable plane of interleaved samples.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Plane<'a, T> {
    pub samples: &'a [T],
    pub rows: usize,
    pub columns: usize,
    /// samples per pixel
    pub components: usize,
}

impl<'a, T: Copy> Plane<'a, T> {
    pub fn new(samples: &'a [T], rows: usize, columns: usize, components: usize) -> Self {
        debug_assert_eq!(samples.len(), rows * columns * components);
        Plane {
            samples,
            rows,
            columns,
            components,
        }
    }

    #[inline]
    fn at(&self, row: usize, column: usize, component: usize) -> T {
        self.samples[(row * self.columns + column) * self.components + component]
    }
}

/// A source coordinate along one axis:
/// the two neighbouring indices and the weight of the second.
#[derive(Debug, Copy, Clone, PartialEq)]
struct Tap {
    i: usize,
    j: usize,
    frac: f64,
}

/// Map every destination index onto the source axis.
fn taps(src: usize, dst: usize) -> Vec<Tap> {
    let last = src.saturating_sub(1);
    (0..dst)
        .map(|d| {
            let s = if dst > 1 {
                d as f64 * last as f64 / (dst - 1) as f64
            } else {
                0.
            };
            let i = (s.floor() as usize).min(last);
            Tap {
                i,
                j: (i + 1).min(last),
                frac: s - i as f64,
            }
        })
        .collect()
}

/// Resample a plane with bilinear interpolation.
///
/// Each component is interpolated independently.
/// Corner samples of the source land on the corners of the destination.
pub fn bilinear<T: Sample>(src: &Plane<T>, dst_rows: usize, dst_columns: usize) -> Vec<T> {
    if src.samples.is_empty() {
        return Vec::new();
    }
    let row_taps = taps(src.rows, dst_rows);
    let column_taps = taps(src.columns, dst_columns);

    let mut out = Vec::with_capacity(dst_rows * dst_columns * src.components);
    for r in &row_taps {
        for c in &column_taps {
            for k in 0..src.components {
                let top = src.at(r.i, c.i, k).as_() * (1. - c.frac)
                    + src.at(r.i, c.j, k).as_() * c.frac;
                let bottom = src.at(r.j, c.i, k).as_() * (1. - c.frac)
                    + src.at(r.j, c.j, k).as_() * c.frac;
                out.push(T::from_f64_lossy(top * (1. - r.frac) + bottom * r.frac));
            }
        }
    }
    out
}

/// Resample a plane by replicating the nearest sample
/// at or before each destination coordinate.
pub fn replicate<T: Copy>(src: &Plane<T>, dst_rows: usize, dst_columns: usize) -> Vec<T> {
    if src.samples.is_empty() {
        return Vec::new();
    }
    let row_taps = taps(src.rows, dst_rows);
    let column_taps = taps(src.columns, dst_columns);

    let mut out = Vec::with_capacity(dst_rows * dst_columns * src.components);
    for r in &row_taps {
        for c in &column_taps {
            let start = (r.i * src.columns + c.i) * src.components;
            out.extend_from_slice(&src.samples[start..start + src.components]);
        }
    }
    out
}

/// Resample a plane with the given method.
pub fn resize<T: Sample>(
    src: &Plane<T>,
    dst_rows: usize,
    dst_columns: usize,
    scaling_type: ScalingType,
) -> Vec<T> {
    match scaling_type {
        ScalingType::Bilinear => bilinear(src, dst_rows, dst_columns),
        ScalingType::Replicate => replicate(src, dst_rows, dst_columns),
    }
}

/// The grid of a frame of samples.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub struct Grid {
    pub rows: usize,
    pub columns: usize,
    pub components: usize,
    /// whether each component is stored in its own plane
    pub planar: bool,
}

/// Resample every plane of a frame onto the destination grid.
fn resize_frame<T: Sample>(
    samples: &[T],
    grid: Grid,
    dst_rows: usize,
    dst_columns: usize,
    scaling_type: ScalingType,
) -> Vec<T> {
    let plane_len = grid.rows * grid.columns;
    if plane_len == 0 {
        // nothing to sample from
        return vec![T::from_f64_lossy(0.); dst_rows * dst_columns * grid.components];
    }
    if !grid.planar || grid.components == 1 {
        let src = Plane::new(samples, grid.rows, grid.columns, grid.components);
        return resize(&src, dst_rows, dst_columns, scaling_type);
    }
    let mut out = Vec::with_capacity(dst_rows * dst_columns * grid.components);
    for plane in samples.chunks_exact(plane_len) {
        let src = Plane::new(plane, grid.rows, grid.columns, 1);
        out.extend(resize(&src, dst_rows, dst_columns, scaling_type));
    }
    out
}

/// Resample typed samples onto the destination grid,
/// keeping their sample type.
pub fn resize_samples(
    samples: &SampleBuffer<'_>,
    grid: Grid,
    dst_rows: usize,
    dst_columns: usize,
    scaling_type: ScalingType,
) -> SampleBuffer<'static> {
    macro_rules! resized {
        ($($variant: ident),*) => {
            match samples {
                $(
                    SampleBuffer::$variant(s) => SampleBuffer::$variant(Cow::Owned(
                        resize_frame(s, grid, dst_rows, dst_columns, scaling_type),
                    )),
                )*
            }
        };
    }
    resized!(U8, I8, U16, I16, U32, I32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bilinear_upsampling_keeps_corners() {
        let samples = [0_u16, 100, 200, 300];
        let src = Plane::new(&samples, 2, 2, 1);
        let out = bilinear(&src, 3, 3);
        assert_eq!(out.len(), 9);
        assert_eq!(out[4], 150);
        assert_eq!([out[0], out[2], out[6], out[8]], [0, 100, 200, 300]);
        // edge midpoints
        assert_eq!([out[1], out[3], out[5], out[7]], [50, 100, 200, 250]);
    }

    #[test]
    fn bilinear_interpolates_each_component() {
        // 1x2 RGB
        let samples = [0_u8, 10, 200, 100, 20, 0];
        let src = Plane::new(&samples, 1, 2, 3);
        let out = bilinear(&src, 1, 3);
        assert_eq!(out, vec![0, 10, 200, 50, 15, 100, 100, 20, 0]);
    }

    #[test]
    fn replicate_copies_nearest_towards_origin() {
        let samples = [1_i16, 2, 3, 4];
        let src = Plane::new(&samples, 2, 2, 1);
        let out = replicate(&src, 3, 3);
        assert_eq!(out, vec![1, 1, 2, 1, 1, 2, 3, 3, 4]);
    }

    #[test]
    fn replicate_keeps_component_stride() {
        let samples = [1_u8, 2, 3, 4, 5, 6];
        let src = Plane::new(&samples, 1, 2, 3);
        let out = replicate(&src, 1, 4);
        assert_eq!(out, vec![1, 2, 3, 1, 2, 3, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn downsampling_to_one_sample_takes_origin() {
        let samples = [7_u8, 8, 9, 10];
        let src = Plane::new(&samples, 2, 2, 1);
        assert_eq!(resize(&src, 1, 1, ScalingType::Bilinear), vec![7]);
        assert_eq!(resize(&src, 1, 1, ScalingType::Replicate), vec![7]);
    }

    #[test]
    fn planar_frames_are_resized_per_plane() {
        // two 1x2 planes
        let samples = SampleBuffer::U16(Cow::Owned(vec![0, 100, 1000, 2000]));
        let grid = Grid {
            rows: 1,
            columns: 2,
            components: 2,
            planar: true,
        };
        let out = resize_samples(&samples, grid, 1, 3, ScalingType::Bilinear);
        assert_eq!(
            out,
            SampleBuffer::U16(Cow::Owned(vec![0, 50, 100, 1000, 1500, 2000]))
        );
    }

    #[test]
    fn empty_frames_resize_to_zeros() {
        let samples = SampleBuffer::U8(Cow::Owned(Vec::new()));
        for planar in [true, false] {
            let grid = Grid {
                rows: 0,
                columns: 0,
                components: 3,
                planar,
            };
            for scaling_type in [ScalingType::Bilinear, ScalingType::Replicate] {
                let out = resize_samples(&samples, grid, 2, 2, scaling_type);
                assert_eq!(out, SampleBuffer::U8(Cow::Owned(vec![0; 12])));
            }
        }
    }
}
