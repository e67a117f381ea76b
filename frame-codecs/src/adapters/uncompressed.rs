//! Support for native (uncompressed) pixel data.

use crate::adapters::{DecodeResult, DecodedFrame, FrameDecoder, FrameInfo, FrameParameters};
use byteordered::Endianness;
use std::borrow::Cow;
use tracing::debug;

/// Adapter for native pixel data in
/// Implicit VR Little Endian, Explicit VR Little Endian
/// and Explicit VR Big Endian.
///
/// The frame is passed through without copying.
/// Samples are left in the transfer syntax's byte order,
/// to be corrected when typed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NativeAdapter {
    byte_order: Endianness,
}

impl NativeAdapter {
    /// Adapter for little endian transfer syntaxes.
    pub const LITTLE_ENDIAN: NativeAdapter = NativeAdapter {
        byte_order: Endianness::Little,
    };

    /// Adapter for Explicit VR Big Endian.
    pub const BIG_ENDIAN: NativeAdapter = NativeAdapter {
        byte_order: Endianness::Big,
    };

    /// The byte order of samples coming out of this adapter.
    pub fn byte_order(&self) -> Endianness {
        self.byte_order
    }
}

impl FrameDecoder for NativeAdapter {
    fn decode_frame<'a>(
        &self,
        encoded: &'a [u8],
        params: &FrameParameters,
    ) -> DecodeResult<DecodedFrame<'a>> {
        let frame_size = params.frame_size();
        // odd-length frames carry a trailing padding byte
        let data = if encoded.len() > frame_size {
            debug!(
                "Ignoring {} trailing bytes after native frame",
                encoded.len() - frame_size
            );
            &encoded[..frame_size]
        } else {
            encoded
        };

        Ok(DecodedFrame {
            data: Cow::Borrowed(data),
            info: FrameInfo::from_parameters(params),
            byte_order: self.byte_order,
            truncated: false,
        })
    }
}
