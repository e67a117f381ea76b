//! Typing of decoded sample bytes.
//!
//! Decoded frames come out of the frame adapters as plain bytes.
//! This module reinterprets them as a slice of numeric samples
//! according to _Bits Allocated_ and _Pixel Representation_,
//! correcting the byte order and sign extending samples
//! which do not use every allocated bit.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use dicom_frame_codecs::adapters::Endianness;
use num_traits::AsPrimitive;
use safe_transmute::TriviallyTransmutable;
use snafu::ensure;
use std::borrow::Cow;
use tracing::trace;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::{Result, UnsupportedPixelFormatSnafu};

/// A numeric sample type.
pub trait Sample: Copy + PartialOrd + Send + Sync + AsPrimitive<f64> + 'static {
    /// Convert a value into this type,
    /// rounding to the nearest integer and saturating
    /// for integer types.
    fn from_f64_lossy(value: f64) -> Self;
}

macro_rules! impl_integer_sample {
    ($($t: ty),*) => {
        $(
            impl Sample for $t {
                #[inline]
                fn from_f64_lossy(value: f64) -> Self {
                    // float to int casts saturate, NaN becomes 0
                    value.round() as $t
                }
            }
        )*
    };
}

impl_integer_sample!(u8, i8, u16, i16, u32, i32);

impl Sample for f32 {
    #[inline]
    fn from_f64_lossy(value: f64) -> Self {
        value as f32
    }
}

/// The byte order of the target machine.
pub(crate) fn native_byte_order() -> Endianness {
    if cfg!(target_endian = "big") {
        Endianness::Big
    } else {
        Endianness::Little
    }
}

/// A typed view over the samples of a decoded frame.
///
/// Samples are borrowed from the decoded bytes when possible.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleBuffer<'a> {
    U8(Cow<'a, [u8]>),
    I8(Cow<'a, [i8]>),
    U16(Cow<'a, [u16]>),
    I16(Cow<'a, [i16]>),
    U32(Cow<'a, [u32]>),
    I32(Cow<'a, [i32]>),
}

/// Run an expression over the typed samples of a [`SampleBuffer`],
/// whichever their type.
macro_rules! with_samples {
    ($buffer: expr, $samples: ident => $e: expr) => {
        match $buffer {
            SampleBuffer::U8($samples) => $e,
            SampleBuffer::I8($samples) => $e,
            SampleBuffer::U16($samples) => $e,
            SampleBuffer::I16($samples) => $e,
            SampleBuffer::U32($samples) => $e,
            SampleBuffer::I32($samples) => $e,
        }
    };
}
pub(crate) use with_samples;

impl SampleBuffer<'_> {
    /// Number of samples.
    pub fn len(&self) -> usize {
        with_samples!(self, s => s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the samples are of a signed type.
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            SampleBuffer::I8(_) | SampleBuffer::I16(_) | SampleBuffer::I32(_)
        )
    }

    /// Whether the samples are still borrowed from the decoded bytes.
    pub fn is_borrowed(&self) -> bool {
        with_samples!(self, s => matches!(s, Cow::Borrowed(_)))
    }

    /// Sign extend every sample from `bits_stored` bits
    /// to the full width of the sample type.
    ///
    /// Only affects signed samples with `bits_stored`
    /// smaller than their type.
    pub fn sign_extend(&mut self, bits_stored: u16) {
        match self {
            SampleBuffer::I8(samples) if bits_stored < 8 => {
                for v in samples.to_mut() {
                    *v = sign_extend(i32::from(*v), bits_stored) as i8;
                }
            }
            SampleBuffer::I16(samples) if bits_stored < 16 => {
                for v in samples.to_mut() {
                    *v = sign_extend(i32::from(*v), bits_stored) as i16;
                }
            }
            SampleBuffer::I32(samples) if bits_stored < 32 => {
                for v in samples.to_mut() {
                    *v = sign_extend(*v, bits_stored);
                }
            }
            _ => {}
        }
    }

    /// The smallest and largest sample values,
    /// or `None` if there are no samples.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        with_samples!(self, s => min_max(s))
    }
}

/// Sign extend `code` from its lowest `bits_stored` bits.
#[inline]
pub fn sign_extend(code: i32, bits_stored: u16) -> i32 {
    let shift = 32 - u32::from(bits_stored.clamp(1, 32));
    code.wrapping_shl(shift).wrapping_shr(shift)
}

/// The smallest and largest values of a slice, in one pass.
pub fn min_max<T: Sample>(samples: &[T]) -> Option<(f64, f64)> {
    fn merge<T: Sample>(acc: Option<(T, T)>, v: T) -> Option<(T, T)> {
        Some(match acc {
            None => (v, v),
            Some((lo, hi)) => (
                if v < lo { v } else { lo },
                if v > hi { v } else { hi },
            ),
        })
    }

    #[cfg(feature = "rayon")]
    let bounds = samples
        .par_iter()
        .fold(|| None, |acc, &v| merge(acc, v))
        .reduce(
            || None,
            |a, b| match (a, b) {
                (Some((lo, hi)), b) => merge(merge(b, lo), hi),
                (None, b) => b,
            },
        );
    #[cfg(not(feature = "rayon"))]
    let bounds = samples.iter().fold(None, |acc, &v| merge(acc, v));

    bounds.map(|(lo, hi)| (lo.as_(), hi.as_()))
}

/// Interpret decoded bytes as typed samples.
///
/// - 1 and 8 bits allocated give byte samples
///   (1-bit frames stay packed, eight samples per byte);
///   signed 8-bit samples are viewed as `i8`.
/// - 16 and 32 bits allocated give 16 and 32-bit integers
///   of the signedness of the pixel representation.
///   Samples are borrowed when they are in native byte order
///   and suitably aligned,
///   and copied otherwise,
///   swapping bytes if they came in the opposite byte order.
///
/// Floating point samples and any other sample size
/// are rejected.
pub fn type_samples(
    bytes: &[u8],
    bits_allocated: u16,
    signed: bool,
    byte_order: Endianness,
    float: bool,
) -> Result<SampleBuffer<'_>> {
    ensure!(
        !float,
        UnsupportedPixelFormatSnafu {
            bits_allocated,
            reason: "floating point samples cannot be typed as integers",
        }
    );

    match (bits_allocated, signed) {
        (1, _) | (8, false) => Ok(SampleBuffer::U8(Cow::Borrowed(bytes))),
        (8, true) => {
            let samples: &[i8] = safe_transmute::transmute_many_permissive(bytes)
                .unwrap_or_default();
            Ok(SampleBuffer::I8(Cow::Borrowed(samples)))
        }
        (16, false) => Ok(SampleBuffer::U16(typed(
            bytes,
            byte_order,
            LittleEndian::read_u16_into,
            BigEndian::read_u16_into,
        ))),
        (16, true) => Ok(SampleBuffer::I16(typed(
            bytes,
            byte_order,
            LittleEndian::read_i16_into,
            BigEndian::read_i16_into,
        ))),
        (32, false) => Ok(SampleBuffer::U32(typed(
            bytes,
            byte_order,
            LittleEndian::read_u32_into,
            BigEndian::read_u32_into,
        ))),
        (32, true) => Ok(SampleBuffer::I32(typed(
            bytes,
            byte_order,
            LittleEndian::read_i32_into,
            BigEndian::read_i32_into,
        ))),
        _ => UnsupportedPixelFormatSnafu {
            bits_allocated,
            reason: "unsupported sample size",
        }
        .fail(),
    }
}

/// View `bytes` as a slice of `T` without copying if possible,
/// otherwise read them with the decoder for their byte order.
fn typed<'a, T>(
    bytes: &'a [u8],
    byte_order: Endianness,
    read_le: fn(&[u8], &mut [T]),
    read_be: fn(&[u8], &mut [T]),
) -> Cow<'a, [T]>
where
    T: TriviallyTransmutable + Default + Copy,
{
    let width = std::mem::size_of::<T>();
    let bytes = &bytes[..bytes.len() / width * width];
    if bytes.is_empty() {
        return Cow::Owned(Vec::new());
    }

    if byte_order == native_byte_order() {
        match safe_transmute::transmute_many_pedantic::<T>(bytes) {
            Ok(samples) => return Cow::Borrowed(samples),
            Err(_) => trace!("Sample buffer is misaligned, copying"),
        }
    }

    let mut samples = vec![T::default(); bytes.len() / width];
    match byte_order {
        Endianness::Little => read_le(bytes, &mut samples),
        Endianness::Big => read_be(bytes, &mut samples),
    }
    Cow::Owned(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn sign_extension_of_12_bit_samples() {
        assert_eq!(sign_extend(0x0FFF, 12), -1);
        assert_eq!(sign_extend(0x0800, 12), -2048);
        assert_eq!(sign_extend(0x07FF, 12), 2047);

        let bytes = 0x0FFF_u16.to_le_bytes();
        let mut samples = type_samples(&bytes, 16, true, Endianness::Little, false).unwrap();
        samples.sign_extend(12);
        assert_eq!(samples, SampleBuffer::I16(Cow::Owned(vec![-1])));
    }

    #[test]
    fn full_width_samples_are_left_alone() {
        let bytes = (-5_i16).to_le_bytes();
        let mut samples = type_samples(&bytes, 16, true, Endianness::Little, false).unwrap();
        samples.sign_extend(16);
        assert_eq!(samples.min_max(), Some((-5., -5.)));
    }

    #[test]
    fn big_endian_samples_are_swapped() {
        let bytes = [0x01, 0x02, 0xFF, 0xFE];
        let samples = type_samples(&bytes, 16, false, Endianness::Big, false).unwrap();
        assert_eq!(samples, SampleBuffer::U16(Cow::Owned(vec![0x0102, 0xFFFE])));

        let bytes = [0x00, 0x00, 0x01, 0x00];
        let samples = type_samples(&bytes, 32, false, Endianness::Big, false).unwrap();
        assert_eq!(samples, SampleBuffer::U32(Cow::Owned(vec![0x0100])));
    }

    #[test]
    fn big_endian_bytes_are_untouched() {
        let bytes = [0x01, 0x02];
        let samples = type_samples(&bytes, 8, false, Endianness::Big, false).unwrap();
        assert_eq!(samples, SampleBuffer::U8(Cow::Borrowed(&bytes[..])));
    }

    #[test]
    fn misaligned_samples_are_copied() {
        let values: Vec<u16> = vec![1, 2, 3, 4];
        let mut bytes: Vec<u8> = Vec::new();
        bytes.push(0);
        for v in &values {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        // one of these slices is misaligned for u16
        for start in 0..2 {
            let slice = &bytes[start..start + 8];
            let expected: Vec<u16> = slice
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect();
            let samples = type_samples(slice, 16, false, Endianness::Little, false).unwrap();
            assert_eq!(samples, SampleBuffer::U16(Cow::Owned(expected)));
        }
    }

    #[test]
    fn signed_bytes_are_viewed_as_i8() {
        let bytes = [0xFF, 0x01];
        let samples = type_samples(&bytes, 8, true, Endianness::Little, false).unwrap();
        assert!(samples.is_borrowed());
        assert_eq!(samples.min_max(), Some((-1., 1.)));
    }

    #[rstest]
    #[case(24)]
    #[case(64)]
    #[case(12)]
    fn unsupported_sample_sizes(#[case] bits_allocated: u16) {
        let err = type_samples(&[0; 8], bits_allocated, false, Endianness::Little, false)
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::UnsupportedPixelFormat);
    }

    #[test]
    fn float_samples_are_rejected() {
        let err = type_samples(&[0; 8], 32, false, Endianness::Little, true).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::UnsupportedPixelFormat);
    }

    #[rstest]
    #[case(16, 1, 16)]
    #[case(512, 512, 512 * 512)]
    fn sample_count_matches_frame_size(
        #[case] rows: usize,
        #[case] columns: usize,
        #[case] expected: usize,
    ) {
        let bytes = vec![0_u8; rows * columns * 2];
        let samples = type_samples(&bytes, 16, false, Endianness::Little, false).unwrap();
        assert_eq!(samples.len(), expected);
    }

    #[test]
    fn min_max_of_empty_slice() {
        assert_eq!(min_max::<u8>(&[]), None);
        assert_eq!(min_max(&[3_u16, 9, 1, 4]), Some((1., 9.)));
    }
}
