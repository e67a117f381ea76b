//! A list of compiled transfer syntax specifiers.
//!
//! The constants exported here refer to the library's built-in support
//! for decoding frames of each transfer syntax.
//!
//! - **Native** transfer syntaxes are decoded by this crate alone.
//! - **External** transfer syntaxes are decoded by a third party codec,
//!   selected through [`ExternalCodecKind`].
//!   Whether the codec is available depends on the enabled Cargo features;
//!   without it, decoding fails with
//!   [`CodecUnavailable`](crate::adapters::DecodeError::CodecUnavailable).

use crate::adapters::rle_lossless::RleLosslessAdapter;
use crate::adapters::uncompressed::NativeAdapter;
use crate::adapters::{decode_error, DecodeResult, ExternalCodec, FrameDecoder};

#[cfg(feature = "deflate")]
use crate::adapters::deflated::DeflatedImageFrameAdapter;
#[cfg(feature = "jpeg")]
use crate::adapters::jpeg::JpegDecoder;
#[cfg(any(feature = "openjp2", feature = "openjpeg-sys"))]
use crate::adapters::jpeg2k::Jpeg2000Decoder;
#[cfg(feature = "charls")]
use crate::adapters::jpegls::JpegLsDecoder;

/// A transfer syntax specifier:
/// its UID, a descriptive name
/// and the means of decoding one of its frames.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TransferSyntax {
    uid: &'static str,
    name: &'static str,
    codec: Codec,
}

impl TransferSyntax {
    pub const fn new(uid: &'static str, name: &'static str, codec: Codec) -> Self {
        TransferSyntax { uid, name, codec }
    }

    /// Obtain this transfer syntax' unique identifier.
    pub const fn uid(&self) -> &'static str {
        self.uid
    }

    /// Obtain the name of this transfer syntax.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Obtain the frame decoding strategy of this transfer syntax.
    pub const fn codec(&self) -> &Codec {
        &self.codec
    }
}

/// How frames of a transfer syntax are decoded.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Codec {
    /// Native pixel data in the given byte order.
    Native(NativeAdapter),
    /// Deflate compressed frames.
    #[cfg(feature = "deflate")]
    Deflated(DeflatedImageFrameAdapter),
    /// RLE Lossless.
    Rle(RleLosslessAdapter),
    /// Decoded by a third party codec.
    External(ExternalCodecKind),
}

impl Codec {
    /// The stateless frame decoder of this codec,
    /// if it is implemented in this crate.
    pub fn frame_decoder(&self) -> Option<&dyn FrameDecoder> {
        match self {
            Codec::Native(adapter) => Some(adapter),
            #[cfg(feature = "deflate")]
            Codec::Deflated(adapter) => Some(adapter),
            Codec::Rle(adapter) => Some(adapter),
            Codec::External(_) => None,
        }
    }
}

/// The kinds of third party codecs.
///
/// Each kind is backed by at most one codec instance at a time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExternalCodecKind {
    /// JPEG baseline and extended
    Jpeg,
    /// JPEG lossless, non-hierarchical
    JpegLossless,
    /// JPEG-LS lossless and near-lossless
    JpegLs,
    /// JPEG 2000 part 1
    Jpeg2000,
    /// High-Throughput JPEG 2000
    Htj2k,
}

impl ExternalCodecKind {
    /// All codec kinds, in a stable order.
    pub const ALL: [ExternalCodecKind; 5] = [
        ExternalCodecKind::Jpeg,
        ExternalCodecKind::JpegLossless,
        ExternalCodecKind::JpegLs,
        ExternalCodecKind::Jpeg2000,
        ExternalCodecKind::Htj2k,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExternalCodecKind::Jpeg => "JPEG",
            ExternalCodecKind::JpegLossless => "JPEG lossless",
            ExternalCodecKind::JpegLs => "JPEG-LS",
            ExternalCodecKind::Jpeg2000 => "JPEG 2000",
            ExternalCodecKind::Htj2k => "HTJ2K",
        }
    }

    /// The Cargo feature which compiles in this codec.
    pub fn feature(self) -> &'static str {
        match self {
            ExternalCodecKind::Jpeg | ExternalCodecKind::JpegLossless => "jpeg",
            ExternalCodecKind::JpegLs => "charls",
            ExternalCodecKind::Jpeg2000 | ExternalCodecKind::Htj2k => "openjp2",
        }
    }

    /// Whether this kind accepts a sub-resolution decode level.
    pub fn supports_decode_level(self) -> bool {
        self == ExternalCodecKind::Htj2k
    }

    /// Construct a new codec instance of this kind.
    ///
    /// Fails with [`CodecUnavailable`](crate::adapters::DecodeError::CodecUnavailable)
    /// if the codec was not compiled in.
    pub fn create(self) -> DecodeResult<Box<dyn ExternalCodec>> {
        match self {
            #[cfg(feature = "jpeg")]
            ExternalCodecKind::Jpeg | ExternalCodecKind::JpegLossless => {
                Ok(Box::new(JpegDecoder::new()))
            }
            #[cfg(feature = "charls")]
            ExternalCodecKind::JpegLs => Ok(Box::new(JpegLsDecoder::new())),
            #[cfg(any(feature = "openjp2", feature = "openjpeg-sys"))]
            ExternalCodecKind::Jpeg2000 => Ok(Box::new(Jpeg2000Decoder::jpeg2000())),
            #[cfg(any(feature = "openjp2", feature = "openjpeg-sys"))]
            ExternalCodecKind::Htj2k => Ok(Box::new(Jpeg2000Decoder::htj2k())),
            #[allow(unreachable_patterns)]
            kind => decode_error::CodecUnavailableSnafu {
                codec: kind.name(),
                feature: kind.feature(),
            }
            .fail(),
        }
    }
}

const fn external(uid: &'static str, name: &'static str, kind: ExternalCodecKind) -> TransferSyntax {
    TransferSyntax::new(uid, name, Codec::External(kind))
}

// -- native transfer syntaxes --

/// **Native:** Implicit VR Little Endian: Default Transfer Syntax for DICOM
pub const IMPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2",
    "Implicit VR Little Endian",
    Codec::Native(NativeAdapter::LITTLE_ENDIAN),
);

/// **Native:** Explicit VR Little Endian
pub const EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.1",
    "Explicit VR Little Endian",
    Codec::Native(NativeAdapter::LITTLE_ENDIAN),
);

/// **Native:** Explicit VR Big Endian
pub const EXPLICIT_VR_BIG_ENDIAN: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.2",
    "Explicit VR Big Endian",
    Codec::Native(NativeAdapter::BIG_ENDIAN),
);

/// **Native:** Deflated Explicit VR Little Endian
#[cfg(feature = "deflate")]
pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.1.99",
    "Deflated Explicit VR Little Endian",
    Codec::Deflated(DeflatedImageFrameAdapter),
);
/// **Native:** Deflated Explicit VR Little Endian
///
/// Without the `deflate` feature,
/// frames are expected to have been inflated upstream.
#[cfg(not(feature = "deflate"))]
pub const DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.1.99",
    "Deflated Explicit VR Little Endian",
    Codec::Native(NativeAdapter::LITTLE_ENDIAN),
);

/// **Native:** RLE Lossless
pub const RLE_LOSSLESS: TransferSyntax = TransferSyntax::new(
    "1.2.840.10008.1.2.5",
    "RLE Lossless",
    Codec::Rle(RleLosslessAdapter),
);

// -- JPEG encoded pixel data --

/// **External:** JPEG Baseline (Process 1): Default Transfer Syntax for Lossy JPEG 8 Bit Image Compression
pub const JPEG_BASELINE: TransferSyntax = external(
    "1.2.840.10008.1.2.4.50",
    "JPEG Baseline (Process 1)",
    ExternalCodecKind::Jpeg,
);

/// **External:** JPEG Extended (Process 2 & 4): Default Transfer Syntax for Lossy JPEG 12 Bit Image Compression (Process 4 only)
pub const JPEG_EXTENDED: TransferSyntax = external(
    "1.2.840.10008.1.2.4.51",
    "JPEG Extended (Process 2 & 4)",
    ExternalCodecKind::Jpeg,
);

/// **External:** JPEG Lossless, Non-Hierarchical (Process 14)
pub const JPEG_LOSSLESS_NON_HIERARCHICAL: TransferSyntax = external(
    "1.2.840.10008.1.2.4.57",
    "JPEG Lossless, Non-Hierarchical (Process 14)",
    ExternalCodecKind::JpegLossless,
);

/// **External:** JPEG Lossless, Non-Hierarchical, First-Order Prediction
/// (Process 14 [Selection Value 1]):
/// Default Transfer Syntax for Lossless JPEG Image Compression
pub const JPEG_LOSSLESS_NON_HIERARCHICAL_FIRST_ORDER_PREDICTION: TransferSyntax = external(
    "1.2.840.10008.1.2.4.70",
    "JPEG Lossless, Non-Hierarchical, First-Order Prediction",
    ExternalCodecKind::JpegLossless,
);

// -- JPEG-LS encoded pixel data --

/// **External:** JPEG-LS Lossless Image Compression
pub const JPEG_LS_LOSSLESS_IMAGE_COMPRESSION: TransferSyntax = external(
    "1.2.840.10008.1.2.4.80",
    "JPEG-LS Lossless Image Compression",
    ExternalCodecKind::JpegLs,
);

/// **External:** JPEG-LS Lossy (Near-Lossless) Image Compression
pub const JPEG_LS_LOSSY_IMAGE_COMPRESSION: TransferSyntax = external(
    "1.2.840.10008.1.2.4.81",
    "JPEG-LS Lossy (Near-Lossless) Image Compression",
    ExternalCodecKind::JpegLs,
);

// -- JPEG 2000 encoded pixel data --

/// **External:** JPEG 2000 Image Compression (Lossless Only)
pub const JPEG_2000_IMAGE_COMPRESSION_LOSSLESS_ONLY: TransferSyntax = external(
    "1.2.840.10008.1.2.4.90",
    "JPEG 2000 Image Compression (Lossless Only)",
    ExternalCodecKind::Jpeg2000,
);

/// **External:** JPEG 2000 Image Compression
pub const JPEG_2000_IMAGE_COMPRESSION: TransferSyntax = external(
    "1.2.840.10008.1.2.4.91",
    "JPEG 2000 Image Compression",
    ExternalCodecKind::Jpeg2000,
);

// -- HTJ2K encoded pixel data --

/// **External:** High-Throughput JPEG 2000 Image Compression (Lossless Only)
pub const HIGH_THROUGHPUT_JPEG_2000_IMAGE_COMPRESSION_LOSSLESS_ONLY: TransferSyntax = external(
    "1.2.840.10008.1.2.4.201",
    "High-Throughput JPEG 2000 Image Compression (Lossless Only)",
    ExternalCodecKind::Htj2k,
);

/// **External:** High-Throughput JPEG 2000 with RPCL Options Image Compression (Lossless Only)
pub const HIGH_THROUGHPUT_JPEG_2000_WITH_RPCL_OPTIONS_IMAGE_COMPRESSION_LOSSLESS_ONLY:
    TransferSyntax = external(
    "1.2.840.10008.1.2.4.202",
    "High-Throughput JPEG 2000 with RPCL Options Image Compression (Lossless Only)",
    ExternalCodecKind::Htj2k,
);

/// **External:** High-Throughput JPEG 2000 Image Compression
pub const HIGH_THROUGHPUT_JPEG_2000_IMAGE_COMPRESSION: TransferSyntax = external(
    "1.2.840.10008.1.2.4.203",
    "High-Throughput JPEG 2000 Image Compression",
    ExternalCodecKind::Htj2k,
);
