//! This crate turns encoded DICOM pixel data frames
//! into typed sample buffers ready for display,
//! along with their value range.
//!
//! A frame is decoded by the adapter of its transfer syntax
//! (see [`dicom_frame_codecs`]),
//! its samples are typed according to the frame's
//! _Bits Allocated_ and _Pixel Representation_,
//! optionally resampled onto a caller's target grid,
//! and optionally rescaled with the modality rescale,
//! including PET SUV and RT dose grid scaling.
//! The output sample type is the smallest one
//! which holds every output value exactly.
//!
//! # Example
//!
//! ```
//! use dicom_frame_pipeline::{
//!     DecodeConfig, DecodeOptions, DecodeRequest, FramePipeline, ImageFrameDescriptor,
//!     PixelBuffer,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = FramePipeline::new(DecodeConfig::default());
//!
//! // a 2x2 frame of 16-bit samples, explicit VR little endian
//! let encoded: Vec<u8> = [0_u16, 100, 200, 300]
//!     .iter()
//!     .flat_map(|v| v.to_le_bytes())
//!     .collect();
//! let descriptor = ImageFrameDescriptor::new(2, 2, 16).with_rescale(2., -100.);
//! let request = DecodeRequest::new(encoded, "1.2.840.10008.1.2.1", descriptor)
//!     .with_options(DecodeOptions::new().with_pre_scale());
//!
//! let frame = pipeline.decode(request).await?;
//! assert_eq!(frame.pixel_data, PixelBuffer::I16(vec![-100, 100, 300, 500]));
//! assert_eq!(frame.smallest_pixel_value, -100.);
//! assert_eq!(frame.largest_pixel_value, 500.);
//! # Ok(())
//! # }
//! ```
//!
//! Requests may also be sent to a [`DecodeWorker`],
//! which decodes each one in its own task.

use dicom_frame_codecs::adapters::DecodeError;
use snafu::Snafu;

pub mod attribute;
pub mod buffer;
pub mod options;
pub mod pipeline;
pub mod registry;
pub mod resize;
pub mod result;
pub mod sample;
pub mod transform;
pub mod worker;

pub use attribute::{ImageFrameDescriptor, Modality, PhotometricInterpretation, PixelRepresentation};
pub use buffer::{NumericKind, PixelBuffer, TargetBuffer};
pub use options::{DecodeConfig, DecodeOptions, DecodeRequest, PreScaleOptions};
pub use pipeline::FramePipeline;
pub use registry::CodecRegistry;
pub use resize::ScalingType;
pub use result::{ImageInfo, PixelFrameResult, PreScale};
pub use transform::{ModalityScale, Rescale, ScalingParameters};
pub use worker::{DecodeWorker, WorkerHandle};

/// The possible errors of a frame decode.
///
/// Every error rejects the whole request,
/// there are no partial results.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("no decoder for transfer syntax {}", uid))]
    UnsupportedTransferSyntax { uid: String },

    #[snafu(display("Unsupported pixel format with {} bits allocated: {}", bits_allocated, reason))]
    UnsupportedPixelFormat {
        bits_allocated: u16,
        reason: &'static str,
    },

    #[snafu(display("Missing or non-numeric scaling parameter {} in {}", parameter, source_name))]
    MissingScalingParameters {
        source_name: &'static str,
        parameter: &'static str,
    },

    #[snafu(display(
        "Target buffer length {} does not match decoded length {}",
        requested,
        decoded
    ))]
    TargetBufferLengthMismatch { requested: usize, decoded: usize },

    #[snafu(display("Could not decode frame"))]
    CodecDecodeFailure { source: DecodeError },

    #[snafu(display("Codec task failed"))]
    CodecTask { source: tokio::task::JoinError },

    #[snafu(display("Decoded {} samples, expected {}", actual, expected))]
    SampleCountMismatch { expected: usize, actual: usize },

    #[snafu(display("Invalid target buffer: {}", reason))]
    InvalidTargetBuffer { reason: String },

    #[snafu(display("Frame was only partially decoded"))]
    TruncatedFrame,

    #[snafu(display("Decode worker is no longer running"))]
    WorkerUnavailable,
}

/// The kind of a decode error,
/// for callers handling errors by category.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    UnsupportedTransferSyntax,
    UnsupportedPixelFormat,
    MissingScalingParameters,
    TargetBufferLengthMismatch,
    CodecDecodeFailure,
    InvalidTargetBuffer,
    TruncatedFrame,
    WorkerUnavailable,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnsupportedTransferSyntax { .. } => ErrorKind::UnsupportedTransferSyntax,
            Error::UnsupportedPixelFormat { .. } => ErrorKind::UnsupportedPixelFormat,
            Error::MissingScalingParameters { .. } => ErrorKind::MissingScalingParameters,
            Error::TargetBufferLengthMismatch { .. } => ErrorKind::TargetBufferLengthMismatch,
            Error::CodecDecodeFailure { .. }
            | Error::CodecTask { .. }
            | Error::SampleCountMismatch { .. } => ErrorKind::CodecDecodeFailure,
            Error::InvalidTargetBuffer { .. } => ErrorKind::InvalidTargetBuffer,
            Error::TruncatedFrame => ErrorKind::TruncatedFrame,
            Error::WorkerUnavailable => ErrorKind::WorkerUnavailable,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
