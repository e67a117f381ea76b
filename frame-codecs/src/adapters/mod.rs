//! Root module for frame adapters.
//!
//! An adapter turns one encoded frame into native sample bytes.
//! Adapters which run entirely in this crate implement [`FrameDecoder`]
//! and hold no state.
//! Adapters wrapping a third party codec implement [`ExternalCodec`]
//! instead: they keep scratch buffers between calls,
//! so callers must hold exclusive access for the whole decode.
//!
//! Support for certain transfer syntaxes can be added via Cargo features.
//!
//! - [`uncompressed`] handles native little and big endian pixel data.
//! - [`deflated`] provides Deflated Explicit VR Little Endian
//!   via `flate2`. Requires the `deflate` feature, enabled by default.
//! - [`rle_lossless`] provides native RLE lossless decoding.
//! - [`jpeg`] provides JPEG baseline, extended and lossless decoding
//!   through `jpeg-decoder`.
//!   Requires the `jpeg` feature, enabled by default.
//! - [`jpegls`] provides JPEG-LS decoding through CharLS.
//!   Requires the `charls` feature.
//! - [`jpeg2k`] contains JPEG 2000 and HTJ2K support through [OpenJPEG].
//!   Enable either `openjp2` or `openjpeg-sys`.
//!
//! [OpenJPEG]: https://github.com/uclouvain/openjpeg
use snafu::Snafu;
use std::borrow::Cow;

#[cfg(feature = "deflate")]
pub mod deflated;
#[cfg(feature = "jpeg")]
pub mod jpeg;
#[cfg(any(feature = "openjp2", feature = "openjpeg-sys"))]
pub mod jpeg2k;
#[cfg(feature = "charls")]
pub mod jpegls;
pub mod rle_lossless;
pub mod uncompressed;

pub use byteordered::Endianness;

/// **Note:** This module is a stub.
/// Enable the `deflate` feature to use this module.
#[cfg(not(feature = "deflate"))]
pub mod deflated {}

/// **Note:** This module is a stub.
/// Enable the `jpeg` feature to use this module.
#[cfg(not(feature = "jpeg"))]
pub mod jpeg {}

/// **Note:** This module is a stub.
/// Enable either `openjp2` or `openjpeg-sys` to use this module.
#[cfg(not(any(feature = "openjp2", feature = "openjpeg-sys")))]
pub mod jpeg2k {}

/// **Note:** This module is a stub.
/// Enable the `charls` feature to use this module.
#[cfg(not(feature = "charls"))]
pub mod jpegls {}

/// The possible error conditions when decoding a frame.
///
/// Users of this type are free to handle errors based on their variant,
/// but should not make decisions based on the display message,
/// since that is not considered part of the API.
#[derive(Debug, Snafu)]
#[non_exhaustive]
#[snafu(visibility(pub), module)]
pub enum DecodeError {
    /// A custom error occurred when decoding,
    /// reported as a dynamic error value with a message.
    ///
    /// The [`whatever!`](snafu::whatever) macro can be used
    /// to easily create an error of this kind.
    #[snafu(whatever, display("{}", message))]
    Custom {
        /// The error message.
        message: String,
        /// The underlying error cause, if any.
        #[snafu(source(from(Box<dyn std::error::Error + Send + Sync + 'static>, Some)))]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },

    /// The adapter cannot handle this sample size.
    #[snafu(display("Bits Allocated of {} is not supported by the {} decoder", bits_allocated, codec))]
    UnsupportedBitsAllocated {
        codec: &'static str,
        bits_allocated: u16,
    },

    /// The RLE header is too short or declares too many segments.
    #[snafu(display("Invalid RLE header: {}", reason))]
    InvalidRleHeader { reason: &'static str },

    /// The third party codec reported a failure.
    ///
    /// Some codecs only report a numeric code;
    /// it can be turned into a message with
    /// [`ExternalCodec::describe_error`].
    #[snafu(display(
        "{} decoder failure: {}",
        codec,
        message.as_deref().unwrap_or("unknown error")
    ))]
    Codec {
        codec: &'static str,
        code: Option<i32>,
        message: Option<String>,
    },

    /// The codec was not compiled into this build.
    #[snafu(display("The {} codec is not available, enable the `{}` feature", codec, feature))]
    CodecUnavailable {
        codec: &'static str,
        feature: &'static str,
    },
}

impl DecodeError {
    /// Fill in the message of a code-only codec failure
    /// using the codec's own error lookup.
    pub fn resolve_message(self, codec: &dyn ExternalCodec) -> Self {
        match self {
            DecodeError::Codec {
                codec: name,
                code: Some(code),
                message: None,
            } => DecodeError::Codec {
                codec: name,
                code: Some(code),
                message: codec.describe_error(code),
            },
            e => e,
        }
    }
}

/// The result of decoding a frame
pub type DecodeResult<T, E = DecodeError> = Result<T, E>;

/// The image attributes an adapter needs to decode one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameParameters {
    /// the _Rows_
    pub rows: u16,
    /// the _Columns_
    pub columns: u16,
    /// the _Samples per Pixel_
    pub samples_per_pixel: u16,
    /// the _Bits Allocated_
    pub bits_allocated: u16,
    /// the _Bits Stored_
    pub bits_stored: u16,
    /// whether samples are signed (_Pixel Representation_ = 1)
    pub signed: bool,
    /// the _Planar Configuration_ (0 = interleaved, 1 = planar)
    pub planar_configuration: u16,
    /// sub-resolution level to decode at, for codecs which support it
    pub decode_level: Option<u32>,
}

impl FrameParameters {
    /// Number of pixels in the frame.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    /// Number of bytes per sample, at least 1.
    #[inline]
    pub fn bytes_per_sample(&self) -> usize {
        (self.bits_allocated as usize + 7) / 8
    }

    /// Size of the native frame in bytes.
    /// 1-bit frames are packed eight samples per byte.
    pub fn frame_size(&self) -> usize {
        let samples = self.pixel_count() * self.samples_per_pixel as usize;
        if self.bits_allocated == 1 {
            (samples + 7) / 8
        } else {
            samples * self.bytes_per_sample()
        }
    }
}

/// Frame properties as reported by the decoder.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FrameInfo {
    pub width: u32,
    pub height: u32,
    pub bits_per_sample: u16,
    pub component_count: u16,
}

impl FrameInfo {
    /// Frame info for adapters which do not report their own,
    /// taken from the frame parameters.
    pub fn from_parameters(params: &FrameParameters) -> Self {
        FrameInfo {
            width: params.columns.into(),
            height: params.rows.into(),
            bits_per_sample: params.bits_allocated,
            component_count: params.samples_per_pixel,
        }
    }

    /// Number of samples described by this frame info.
    #[inline]
    pub fn sample_count(&self) -> usize {
        self.width as usize * self.height as usize * self.component_count as usize
    }
}

/// The outcome of decoding a single frame:
/// sample bytes in standard (interleaved) layout.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame<'a> {
    /// the decoded sample bytes
    pub data: Cow<'a, [u8]>,
    /// frame properties reported by the decoder
    pub info: FrameInfo,
    /// the byte order of multi-byte samples in `data`
    pub byte_order: Endianness,
    /// whether the decoder stopped short of the expected frame size,
    /// leaving the remaining samples zeroed
    pub truncated: bool,
}

impl DecodedFrame<'_> {
    /// Detach the frame from the encoded input buffer.
    pub fn into_owned(self) -> DecodedFrame<'static> {
        DecodedFrame {
            data: Cow::Owned(self.data.into_owned()),
            info: self.info,
            byte_order: self.byte_order,
            truncated: self.truncated,
        }
    }
}

/// A stateless frame decoder implemented in this crate.
pub trait FrameDecoder: Send + Sync {
    /// Decode a single encoded frame.
    ///
    /// Native adapters may return data borrowed from `encoded`.
    fn decode_frame<'a>(
        &self,
        encoded: &'a [u8],
        params: &FrameParameters,
    ) -> DecodeResult<DecodedFrame<'a>>;
}

/// A third party codec instance.
///
/// Instances are expensive to create and keep scratch buffers
/// between calls, so they are meant to be constructed once and reused.
/// A decode borrows the instance mutably for its whole duration.
pub trait ExternalCodec: Send {
    /// A human readable codec name.
    fn name(&self) -> &'static str;

    /// Copy `encoded` into the codec's input buffer,
    /// decode it and return the decoded frame.
    fn decode(
        &mut self,
        encoded: &[u8],
        params: &FrameParameters,
    ) -> DecodeResult<DecodedFrame<'static>>;

    /// Look up the message for a numeric error code
    /// reported by this codec.
    fn describe_error(&self, _code: i32) -> Option<String> {
        None
    }
}

impl std::fmt::Debug for dyn ExternalCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalCodec")
            .field("name", &self.name())
            .finish()
    }
}
