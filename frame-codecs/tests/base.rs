//! Registry tests, to ensure that transfer syntaxes are properly
//! registered and dispatched to the right decoder.

use dicom_frame_codecs::{get, get_registry, Codec, ExternalCodecKind};
use rstest::rstest;

#[rstest]
#[case("1.2.840.10008.1.2")]
#[case("1.2.840.10008.1.2\0")]
#[case("1.2.840.10008.1.2.1")]
#[case("1.2.840.10008.1.2.1.99")]
#[case("1.2.840.10008.1.2.2")]
#[case("1.2.840.10008.1.2.5")]
fn native_syntaxes_decode_in_process(#[case] uid: &str) {
    let ts = get(uid).expect("transfer syntax should be registered");
    assert_eq!(ts.uid(), uid.trim_end_matches('\0'));
    assert!(ts.codec().frame_decoder().is_some());
}

#[rstest]
#[case("1.2.840.10008.1.2.4.50", ExternalCodecKind::Jpeg)]
#[case("1.2.840.10008.1.2.4.51", ExternalCodecKind::Jpeg)]
#[case("1.2.840.10008.1.2.4.57", ExternalCodecKind::JpegLossless)]
#[case("1.2.840.10008.1.2.4.70", ExternalCodecKind::JpegLossless)]
#[case("1.2.840.10008.1.2.4.80", ExternalCodecKind::JpegLs)]
#[case("1.2.840.10008.1.2.4.81", ExternalCodecKind::JpegLs)]
#[case("1.2.840.10008.1.2.4.90", ExternalCodecKind::Jpeg2000)]
#[case("1.2.840.10008.1.2.4.91", ExternalCodecKind::Jpeg2000)]
#[case("1.2.840.10008.1.2.4.201", ExternalCodecKind::Htj2k)]
#[case("1.2.840.10008.1.2.4.202", ExternalCodecKind::Htj2k)]
#[case("1.2.840.10008.1.2.4.203", ExternalCodecKind::Htj2k)]
fn compressed_syntaxes_use_external_codecs(#[case] uid: &str, #[case] kind: ExternalCodecKind) {
    let ts = get(uid).expect("transfer syntax should be registered");
    assert_eq!(ts.codec(), &Codec::External(kind));
}

#[test]
fn unknown_syntaxes_are_not_registered() {
    assert!(get("9.9.9").is_none());
    // MPEG-2 is known to DICOM but has no frame decoder here
    assert!(get("1.2.840.10008.1.2.4.100").is_none());
}

#[test]
fn every_entry_is_reachable_by_uid() {
    for ts in get_registry().iter() {
        assert_eq!(get(ts.uid()), Some(ts));
    }
}
