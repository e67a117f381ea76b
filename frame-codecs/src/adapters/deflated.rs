//! Support for deflated image frame compression.

use crate::adapters::uncompressed::NativeAdapter;
use crate::adapters::{DecodeResult, DecodedFrame, FrameDecoder, FrameInfo, FrameParameters};
use byteordered::Endianness;
use flate2::read::DeflateDecoder;
use snafu::ResultExt;
use std::borrow::Cow;
use std::io::Read;

/// Adapter for Deflated Explicit VR Little Endian.
///
/// The data set is usually inflated upstream,
/// in which case the frame is native little endian pixel data,
/// possibly followed by a padding byte.
/// Frames shorter than the native frame size
/// are taken as a raw deflate stream and inflated.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeflatedImageFrameAdapter;

impl FrameDecoder for DeflatedImageFrameAdapter {
    fn decode_frame<'a>(
        &self,
        encoded: &'a [u8],
        params: &FrameParameters,
    ) -> DecodeResult<DecodedFrame<'a>> {
        let frame_size = params.frame_size();
        if encoded.len() >= frame_size {
            return NativeAdapter::LITTLE_ENDIAN.decode_frame(encoded, params);
        }

        let mut data = Vec::with_capacity(frame_size);
        DeflateDecoder::new(encoded)
            .take(frame_size as u64)
            .read_to_end(&mut data)
            .whatever_context("failed to inflate frame")?;

        Ok(DecodedFrame {
            data: Cow::Owned(data),
            info: FrameInfo::from_parameters(params),
            byte_order: Endianness::Little,
            truncated: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::DeflateEncoder, Compression};
    use std::io::Write;

    #[test]
    fn inflate_frame() {
        let samples: Vec<u8> = (0..64).map(|v: u16| (v * 3) as u8).collect();
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(&samples).unwrap();
        let encoded = encoder.finish().unwrap();

        let params = FrameParameters {
            rows: 8,
            columns: 8,
            samples_per_pixel: 1,
            bits_allocated: 8,
            bits_stored: 8,
            signed: false,
            planar_configuration: 0,
            decode_level: None,
        };
        let frame = DeflatedImageFrameAdapter
            .decode_frame(&encoded, &params)
            .unwrap();
        assert_eq!(&*frame.data, &samples[..]);
    }

    #[test]
    fn inflated_frames_pass_through() {
        let params = FrameParameters {
            rows: 1,
            columns: 4,
            samples_per_pixel: 1,
            bits_allocated: 8,
            bits_stored: 8,
            signed: false,
            planar_configuration: 0,
            decode_level: None,
        };
        let raw = [4_u8, 3, 2, 1];
        let frame = DeflatedImageFrameAdapter.decode_frame(&raw, &params).unwrap();
        assert!(matches!(frame.data, Cow::Borrowed(_)));
        assert_eq!(&*frame.data, &raw);
    }

    #[test]
    fn padded_frames_are_trimmed() {
        let params = FrameParameters {
            rows: 1,
            columns: 3,
            samples_per_pixel: 1,
            bits_allocated: 8,
            bits_stored: 8,
            signed: false,
            planar_configuration: 0,
            decode_level: None,
        };
        let frame = DeflatedImageFrameAdapter
            .decode_frame(&[1, 2, 3, 0], &params)
            .unwrap();
        assert_eq!(&*frame.data, &[1, 2, 3]);
        assert_eq!(frame.byte_order, Endianness::Little);
    }

    #[test]
    fn garbage_input_fails() {
        let params = FrameParameters {
            rows: 4,
            columns: 4,
            samples_per_pixel: 1,
            bits_allocated: 8,
            bits_stored: 8,
            signed: false,
            planar_configuration: 0,
            decode_level: None,
        };
        assert!(DeflatedImageFrameAdapter
            .decode_frame(&[0xFF, 0xFF, 0xFF, 0xFF], &params)
            .is_err());
    }
}
