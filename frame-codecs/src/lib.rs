//! This crate contains the DICOM transfer syntax table for frame decoding
//! and the frame adapters behind it.
//!
//! The transfer syntax registry maps a DICOM UID of a transfer syntax into the
//! respective transfer syntax specifier,
//! which in turn tells how to decode a single frame of pixel data:
//! either with a stateless [`FrameDecoder`](adapters::FrameDecoder)
//! implemented in this crate,
//! or with an instance of a third party codec
//! ([`ExternalCodec`](adapters::ExternalCodec)).
//!
//! ```
//! use dicom_frame_codecs::{get, Codec};
//!
//! let ts = get("1.2.840.10008.1.2.5\0").unwrap();
//! assert_eq!(ts.name(), "RLE Lossless");
//! assert!(matches!(ts.codec(), Codec::Rle(_)));
//! ```

pub mod adapters;
pub mod entries;

pub use entries::{Codec, ExternalCodecKind, TransferSyntax};

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;

/// Data type for a registry of DICOM transfer syntaxes.
pub struct TransferSyntaxRegistry {
    m: HashMap<&'static str, TransferSyntax>,
}

impl fmt::Debug for TransferSyntaxRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let entries: HashMap<&str, &str> =
            self.m.iter().map(|(uid, ts)| (*uid, ts.name())).collect();
        f.debug_struct("TransferSyntaxRegistry")
            .field("m", &entries)
            .finish()
    }
}

impl TransferSyntaxRegistry {
    /// Obtain a transfer syntax specifier by its UID.
    ///
    /// A trailing null character (used as padding in DICOM)
    /// is ignored.
    pub fn get<U: AsRef<str>>(&self, uid: U) -> Option<&TransferSyntax> {
        let uid = uid.as_ref();
        let ts_uid = uid.strip_suffix('\0').unwrap_or(uid);
        self.m.get(ts_uid)
    }

    /// Iterate over all known transfer syntaxes, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &TransferSyntax> {
        self.m.values()
    }
}

lazy_static! {
    static ref REGISTRY: TransferSyntaxRegistry = {
        TransferSyntaxRegistry { m: initialize_codecs() }
    };
}

/// Retrieve the global transfer syntax registry.
pub fn get_registry() -> &'static TransferSyntaxRegistry {
    &REGISTRY
}

/// Obtain a transfer syntax specifier from the global registry.
pub fn get(uid: &str) -> Option<&'static TransferSyntax> {
    get_registry().get(uid)
}

fn initialize_codecs() -> HashMap<&'static str, TransferSyntax> {
    let mut m = HashMap::<&'static str, TransferSyntax>::new();

    use crate::entries::*;

    // native pixel data
    let ts = IMPLICIT_VR_LITTLE_ENDIAN;
    m.insert(ts.uid(), ts);
    let ts = EXPLICIT_VR_LITTLE_ENDIAN;
    m.insert(ts.uid(), ts);
    let ts = EXPLICIT_VR_BIG_ENDIAN;
    m.insert(ts.uid(), ts);
    let ts = DEFLATED_EXPLICIT_VR_LITTLE_ENDIAN;
    m.insert(ts.uid(), ts);
    let ts = RLE_LOSSLESS;
    m.insert(ts.uid(), ts);

    // third party codecs
    let ts = JPEG_BASELINE;
    m.insert(ts.uid(), ts);
    let ts = JPEG_EXTENDED;
    m.insert(ts.uid(), ts);
    let ts = JPEG_LOSSLESS_NON_HIERARCHICAL;
    m.insert(ts.uid(), ts);
    let ts = JPEG_LOSSLESS_NON_HIERARCHICAL_FIRST_ORDER_PREDICTION;
    m.insert(ts.uid(), ts);
    let ts = JPEG_LS_LOSSLESS_IMAGE_COMPRESSION;
    m.insert(ts.uid(), ts);
    let ts = JPEG_LS_LOSSY_IMAGE_COMPRESSION;
    m.insert(ts.uid(), ts);
    let ts = JPEG_2000_IMAGE_COMPRESSION_LOSSLESS_ONLY;
    m.insert(ts.uid(), ts);
    let ts = JPEG_2000_IMAGE_COMPRESSION;
    m.insert(ts.uid(), ts);
    let ts = HIGH_THROUGHPUT_JPEG_2000_IMAGE_COMPRESSION_LOSSLESS_ONLY;
    m.insert(ts.uid(), ts);
    let ts = HIGH_THROUGHPUT_JPEG_2000_WITH_RPCL_OPTIONS_IMAGE_COMPRESSION_LOSSLESS_ONLY;
    m.insert(ts.uid(), ts);
    let ts = HIGH_THROUGHPUT_JPEG_2000_IMAGE_COMPRESSION;
    m.insert(ts.uid(), ts);

    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_uid_is_absent() {
        assert!(get("9.9.9").is_none());
        assert!(get("").is_none());
        assert!(get("1.2.840.10008.1.2.8.1").is_none());
    }

    #[test]
    fn trailing_null_is_ignored() {
        let ts = get("1.2.840.10008.1.2.2\0").unwrap();
        assert_eq!(ts.uid(), "1.2.840.10008.1.2.2");
    }

    #[test]
    fn registry_has_every_entry() {
        assert_eq!(get_registry().iter().count(), 16);
    }
}
