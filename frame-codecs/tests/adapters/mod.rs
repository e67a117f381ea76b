//! Utility module for testing frame adapters.
use dicom_frame_codecs::adapters::FrameParameters;

/// Frame parameters for an unsigned, interleaved frame.
pub(crate) fn frame_parameters(
    rows: u16,
    columns: u16,
    samples_per_pixel: u16,
    bits_allocated: u16,
) -> FrameParameters {
    FrameParameters {
        rows,
        columns,
        samples_per_pixel,
        bits_allocated,
        bits_stored: bits_allocated,
        signed: false,
        planar_configuration: 0,
        decode_level: None,
    }
}

/// Assemble an RLE frame out of already encoded segments,
/// writing the 64-byte header in front of them.
#[allow(dead_code)]
pub(crate) fn rle_frame(segments: &[&[u8]]) -> Vec<u8> {
    let mut frame = vec![0_u8; 64];
    frame[0..4].copy_from_slice(&(segments.len() as u32).to_le_bytes());
    for (i, segment) in segments.iter().enumerate() {
        let offset = frame.len() as u32;
        frame[4 * (i + 1)..4 * (i + 2)].copy_from_slice(&offset.to_le_bytes());
        frame.extend_from_slice(segment);
    }
    frame
}

/// PackBits-encode a byte plane using literal runs only.
#[allow(dead_code)]
pub(crate) fn packbits_literal(plane: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(plane.len() + plane.len() / 128 + 1);
    for chunk in plane.chunks(128) {
        out.push((chunk.len() - 1) as u8);
        out.extend_from_slice(chunk);
    }
    out
}
