//! Support for RLE Lossless frame decoding.
//!
//! See <https://dicom.nema.org/medical/dicom/2023e/output/chtml/part05/chapter_G.html>
use byteordered::byteorder::{ByteOrder, LittleEndian};
use byteordered::Endianness;
use snafu::ensure;
use std::borrow::Cow;
use std::ops::Range;
use tracing::{debug, warn};

use crate::adapters::{
    decode_error, DecodeResult, DecodedFrame, FrameDecoder, FrameInfo, FrameParameters,
};

/// Size of the RLE header: segment count plus 15 segment offsets.
const HEADER_LEN: usize = 64;
/// Maximum number of segments in an RLE frame.
const MAX_SEGMENTS: usize = 15;

/// Frame adapter for the RLE Lossless transfer syntax.
///
/// Decoding never fails on malformed segment data.
/// A segment which runs out of input before filling its plane
/// leaves the remaining samples zeroed
/// and marks the frame as [truncated](DecodedFrame::truncated).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RleLosslessAdapter;

impl FrameDecoder for RleLosslessAdapter {
    fn decode_frame<'a>(
        &self,
        encoded: &'a [u8],
        params: &FrameParameters,
    ) -> DecodeResult<DecodedFrame<'a>> {
        let segments = read_rle_header(encoded)?;
        let pixel_count = params.pixel_count();
        let samples_per_pixel = params.samples_per_pixel.max(1) as usize;

        // RLE encoded data is ordered like this (for 16-bit, 3 samples):
        //  Segment: 0     | 1     | 2     | 3     | 4     | 5
        //           R MSB | R LSB | G MSB | G LSB | B MSB | B LSB
        //  A segment contains only the MSB or LSB parts of all the sample pixels
        //
        // Output is little endian, with one plane per sample
        // if the planar configuration asks for it.
        let layout = match (params.bits_allocated, params.planar_configuration) {
            (8, 1) => SegmentLayout::Planar8,
            (8, _) => SegmentLayout::Interleaved8,
            (16, 1) => SegmentLayout::Planar16,
            (16, _) => SegmentLayout::Interleaved16,
            (bits_allocated, _) => {
                return decode_error::UnsupportedBitsAllocatedSnafu {
                    codec: "RLE lossless",
                    bits_allocated,
                }
                .fail()
            }
        };

        let expected_segments = layout.segment_count(samples_per_pixel);
        let mut out = vec![0_u8; pixel_count * samples_per_pixel * layout.bytes_per_sample()];
        let mut truncated = false;

        if segments.len() < expected_segments {
            warn!(
                "RLE frame has {} segments, {} expected",
                segments.len(),
                expected_segments
            );
            truncated = true;
        } else if segments.len() > expected_segments {
            debug!(
                "Ignoring {} extra RLE segments",
                segments.len() - expected_segments
            );
        }

        for (segment_index, range) in segments.iter().take(expected_segments).enumerate() {
            let segment = &encoded[range.clone()];
            let written = unpack_segment(segment, pixel_count, |i, byte| {
                out[layout.position(segment_index, i, samples_per_pixel, pixel_count)] = byte;
            });
            if written < pixel_count {
                warn!(
                    "RLE segment #{} decoded to {} of {} bytes",
                    segment_index, written, pixel_count
                );
                truncated = true;
            }
        }

        Ok(DecodedFrame {
            data: Cow::Owned(out),
            info: FrameInfo::from_parameters(params),
            byte_order: Endianness::Little,
            truncated,
        })
    }
}

/// Where each segment's bytes land in the output buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum SegmentLayout {
    /// segment k is sample k of every pixel
    Interleaved8,
    /// segment k is a contiguous plane
    Planar8,
    /// segments 2c and 2c+1 are the high and low bytes of sample c
    Interleaved16,
    /// segments 2c and 2c+1 are the high and low bytes of plane c
    Planar16,
}

impl SegmentLayout {
    fn bytes_per_sample(self) -> usize {
        match self {
            SegmentLayout::Interleaved8 | SegmentLayout::Planar8 => 1,
            SegmentLayout::Interleaved16 | SegmentLayout::Planar16 => 2,
        }
    }

    fn segment_count(self, samples_per_pixel: usize) -> usize {
        samples_per_pixel * self.bytes_per_sample()
    }

    /// Output byte offset of the `i`-th decoded byte of a segment.
    #[inline]
    fn position(
        self,
        segment: usize,
        i: usize,
        samples_per_pixel: usize,
        pixel_count: usize,
    ) -> usize {
        match self {
            SegmentLayout::Interleaved8 => i * samples_per_pixel + segment,
            SegmentLayout::Planar8 => segment * pixel_count + i,
            SegmentLayout::Interleaved16 => {
                let sample = segment / 2;
                // the first segment of each pair holds the most significant byte
                let high = segment % 2 == 0;
                (i * samples_per_pixel + sample) * 2 + usize::from(high)
            }
            SegmentLayout::Planar16 => {
                let high = segment % 2 == 0;
                ((segment / 2) * pixel_count + i) * 2 + usize::from(high)
            }
        }
    }
}

/// Read the RLE header and return the byte range of each segment.
///
/// An end offset of zero (or a missing one, for the last segment)
/// means "until the end of the frame".
/// Offsets beyond the frame are clamped to it.
fn read_rle_header(fragment: &[u8]) -> DecodeResult<Vec<Range<usize>>> {
    ensure!(
        fragment.len() >= 4,
        decode_error::InvalidRleHeaderSnafu {
            reason: "frame is too short to hold the segment count",
        }
    );
    let nr_segments = LittleEndian::read_u32(&fragment[0..4]) as usize;
    ensure!(
        nr_segments <= MAX_SEGMENTS,
        decode_error::InvalidRleHeaderSnafu {
            reason: "more than 15 segments",
        }
    );

    let offset_at = |slot: usize| -> usize {
        let pos = 4 * (slot + 1);
        fragment
            .get(pos..pos + 4)
            .filter(|_| pos + 4 <= HEADER_LEN)
            .map(|bytes| LittleEndian::read_u32(bytes) as usize)
            .unwrap_or(0)
    };

    let end_of_frame = fragment.len();
    let segments = (0..nr_segments)
        .map(|s| {
            let start = offset_at(s).min(end_of_frame);
            let end = if s + 1 < nr_segments {
                offset_at(s + 1)
            } else {
                0
            };
            let end = if end == 0 { end_of_frame } else { end.min(end_of_frame) };
            start..end.max(start)
        })
        .collect();
    Ok(segments)
}

/// Decode a PackBits segment,
/// passing each decoded byte and its index to `put`.
///
/// Decoding stops after `capacity` bytes
/// or when the segment runs out,
/// whichever comes first.
/// Returns the number of bytes produced.
fn unpack_segment(segment: &[u8], capacity: usize, mut put: impl FnMut(usize, u8)) -> usize {
    let mut written = 0;
    let mut pos = 0;
    while pos < segment.len() && written < capacity {
        let header = segment[pos] as i8;
        pos += 1;

        if header >= 0 {
            // literal run of (n + 1) bytes
            let run = header as usize + 1;
            let literal = &segment[pos..(pos + run).min(segment.len())];
            for &byte in literal.iter().take(capacity - written) {
                put(written, byte);
                written += 1;
            }
            pos += literal.len();
        } else if header != -128 {
            // replicate the next byte (1 - n) times
            let Some(&byte) = segment.get(pos) else {
                break;
            };
            pos += 1;
            let run = (1 - header as isize) as usize;
            for _ in 0..run.min(capacity - written) {
                put(written, byte);
                written += 1;
            }
        }
        // -128 is a no-op
    }
    written
}
