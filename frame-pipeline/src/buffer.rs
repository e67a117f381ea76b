//! Output sample buffers and the selection of their numeric type.

use crate::sample::{with_samples, Sample, SampleBuffer};
use crate::transform::ModalityScale;
use num_traits::AsPrimitive;
use safe_transmute::to_bytes::transmute_to_bytes;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// The numeric type of the samples in an output buffer.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum NumericKind {
    U8,
    U16,
    U32,
    I8,
    I16,
    F32,
}

impl NumericKind {
    /// The smallest kind which represents every value
    /// in the inclusive range `min..=max` exactly.
    ///
    /// Non-integral bounds and ranges too wide
    /// for the integer kinds give [`NumericKind::F32`].
    pub fn for_range(min: f64, max: f64) -> NumericKind {
        const INTEGER_KINDS: [NumericKind; 5] = [
            NumericKind::U8,
            NumericKind::U16,
            NumericKind::U32,
            NumericKind::I8,
            NumericKind::I16,
        ];
        let candidates: &[NumericKind] = if min >= 0. {
            &INTEGER_KINDS[..3]
        } else {
            &INTEGER_KINDS[3..]
        };
        candidates
            .iter()
            .copied()
            .find(|kind| kind.can_represent(min, max))
            .unwrap_or(NumericKind::F32)
    }

    /// The range of integer values of this kind,
    /// `None` for floating point.
    pub fn integer_bounds(self) -> Option<(f64, f64)> {
        match self {
            NumericKind::U8 => Some((u8::MIN.into(), u8::MAX.into())),
            NumericKind::U16 => Some((u16::MIN.into(), u16::MAX.into())),
            NumericKind::U32 => Some((u32::MIN.into(), u32::MAX.into())),
            NumericKind::I8 => Some((i8::MIN.into(), i8::MAX.into())),
            NumericKind::I16 => Some((i16::MIN.into(), i16::MAX.into())),
            NumericKind::F32 => None,
        }
    }

    /// Whether every value in `min..=max` fits this kind.
    ///
    /// Floating point accepts any finite range.
    pub fn can_represent(self, min: f64, max: f64) -> bool {
        match self.integer_bounds() {
            Some((lo, hi)) => {
                min.fract() == 0. && max.fract() == 0. && min >= lo && max <= hi
            }
            None => min.is_finite() && max.is_finite(),
        }
    }

    /// Size of one sample in bytes.
    pub fn bytes(self) -> usize {
        match self {
            NumericKind::U8 | NumericKind::I8 => 1,
            NumericKind::U16 | NumericKind::I16 => 2,
            NumericKind::U32 | NumericKind::F32 => 4,
        }
    }

    pub fn is_16bit(self) -> bool {
        matches!(self, NumericKind::U16 | NumericKind::I16)
    }
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NumericKind::U8 => "u8",
            NumericKind::U16 => "u16",
            NumericKind::U32 => "u32",
            NumericKind::I8 => "i8",
            NumericKind::I16 => "i16",
            NumericKind::F32 => "f32",
        })
    }
}

impl FromStr for NumericKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "u8" => Ok(NumericKind::U8),
            "u16" => Ok(NumericKind::U16),
            "u32" => Ok(NumericKind::U32),
            "i8" => Ok(NumericKind::I8),
            "i16" => Ok(NumericKind::I16),
            "f32" => Ok(NumericKind::F32),
            _ => Err(format!("unknown numeric kind `{}`", s)),
        }
    }
}

/// An owned buffer of output samples.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelBuffer {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    I8(Vec<i8>),
    I16(Vec<i16>),
    F32(Vec<f32>),
}

macro_rules! with_pixels {
    ($buffer: expr, $pixels: ident => $e: expr) => {
        match $buffer {
            PixelBuffer::U8($pixels) => $e,
            PixelBuffer::U16($pixels) => $e,
            PixelBuffer::U32($pixels) => $e,
            PixelBuffer::I8($pixels) => $e,
            PixelBuffer::I16($pixels) => $e,
            PixelBuffer::F32($pixels) => $e,
        }
    };
}

/// Write converted samples into `out`,
/// passing each value through `f`.
fn convert_into<S, T>(samples: &[S], out: &mut [T], f: &(impl Fn(f64) -> f64 + Send + Sync))
where
    S: Sample,
    T: Sample,
{
    debug_assert_eq!(samples.len(), out.len());
    #[cfg(feature = "rayon")]
    out.par_iter_mut()
        .zip(samples.par_iter())
        .for_each(|(o, v)| *o = T::from_f64_lossy(f(v.as_())));
    #[cfg(not(feature = "rayon"))]
    for (o, v) in out.iter_mut().zip(samples) {
        *o = T::from_f64_lossy(f(v.as_()));
    }
}

/// The value mapping of a conversion: the rescale, if any.
fn scale_fn(scale: Option<ModalityScale>) -> impl Fn(f64) -> f64 + Send + Sync {
    move |v| match &scale {
        Some(scale) => scale.apply(v),
        None => v,
    }
}

impl PixelBuffer {
    /// Allocate a zeroed buffer of `len` samples.
    pub fn allocate(kind: NumericKind, len: usize) -> PixelBuffer {
        match kind {
            NumericKind::U8 => PixelBuffer::U8(vec![0; len]),
            NumericKind::U16 => PixelBuffer::U16(vec![0; len]),
            NumericKind::U32 => PixelBuffer::U32(vec![0; len]),
            NumericKind::I8 => PixelBuffer::I8(vec![0; len]),
            NumericKind::I16 => PixelBuffer::I16(vec![0; len]),
            NumericKind::F32 => PixelBuffer::F32(vec![0.; len]),
        }
    }

    /// Build a buffer of the given kind out of typed samples,
    /// rescaling them on the way if a scale is given.
    pub fn from_samples(
        samples: &SampleBuffer<'_>,
        kind: NumericKind,
        scale: Option<ModalityScale>,
    ) -> PixelBuffer {
        let f = scale_fn(scale);
        let mut buffer = PixelBuffer::allocate(kind, samples.len());
        with_samples!(samples, s => buffer.fill(s, &f));
        buffer
    }

    /// Re-type this buffer into the given kind,
    /// rescaling the values on the way if a scale is given.
    pub fn converted(&self, kind: NumericKind, scale: Option<ModalityScale>) -> PixelBuffer {
        let f = scale_fn(scale);
        let mut buffer = PixelBuffer::allocate(kind, self.len());
        with_pixels!(self, p => buffer.fill(p, &f));
        buffer
    }

    /// Overwrite every sample with the converted source samples.
    fn fill<S: Sample>(&mut self, samples: &[S], f: &(impl Fn(f64) -> f64 + Send + Sync)) {
        with_pixels!(self, p => convert_into(samples, p, f))
    }

    pub fn kind(&self) -> NumericKind {
        match self {
            PixelBuffer::U8(_) => NumericKind::U8,
            PixelBuffer::U16(_) => NumericKind::U16,
            PixelBuffer::U32(_) => NumericKind::U32,
            PixelBuffer::I8(_) => NumericKind::I8,
            PixelBuffer::I16(_) => NumericKind::I16,
            PixelBuffer::F32(_) => NumericKind::F32,
        }
    }

    pub fn len(&self) -> usize {
        with_pixels!(self, p => p.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the sample at the given index as a double.
    pub fn get(&self, index: usize) -> Option<f64> {
        with_pixels!(self, p => p.get(index).map(|v| v.as_()))
    }

    /// Collect all samples as doubles.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        with_pixels!(self, p => p.iter().map(|v| v.as_()).collect())
    }

    /// View the samples as bytes, in native byte order.
    pub fn as_bytes(&self) -> &[u8] {
        with_pixels!(self, p => transmute_to_bytes(p.as_slice()))
    }
}

/// A caller specified destination for the output samples.
///
/// When backing storage is given along with the request,
/// samples are written into it in native byte order,
/// starting at `byte_offset`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TargetBuffer {
    /// the expected sample type,
    /// chosen from the sample range if not given
    pub kind: Option<NumericKind>,
    /// where the samples start in the backing storage
    pub byte_offset: Option<usize>,
    /// the expected number of samples
    pub length: Option<usize>,
    /// the number of rows of the target grid
    pub rows: Option<u16>,
    /// the number of columns of the target grid
    pub columns: Option<u16>,
}

impl TargetBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: NumericKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_byte_offset(mut self, byte_offset: usize) -> Self {
        self.byte_offset = Some(byte_offset);
        self
    }

    pub fn with_length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_grid(mut self, rows: u16, columns: u16) -> Self {
        self.rows = Some(rows);
        self.columns = Some(columns);
        self
    }
}
