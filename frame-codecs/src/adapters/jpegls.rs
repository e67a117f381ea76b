//! Support for JPEG-LS image decoding.

use crate::adapters::{
    decode_error, DecodeResult, DecodedFrame, ExternalCodec, FrameInfo, FrameParameters,
};
use byteordered::Endianness;
use charls::CharLS;
use snafu::ensure;
use std::borrow::Cow;

const CODEC_NAME: &str = "JPEG-LS";

/// Frame decoder for JPEG-LS lossless and near-lossless
/// transfer syntaxes, backed by CharLS.
#[derive(Debug, Default)]
pub struct JpegLsDecoder {
    input: Vec<u8>,
}

impl JpegLsDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExternalCodec for JpegLsDecoder {
    fn name(&self) -> &'static str {
        CODEC_NAME
    }

    fn decode(
        &mut self,
        encoded: &[u8],
        params: &FrameParameters,
    ) -> DecodeResult<DecodedFrame<'static>> {
        ensure!(
            params.bits_allocated == 8 || params.bits_allocated == 16,
            decode_error::UnsupportedBitsAllocatedSnafu {
                codec: CODEC_NAME,
                bits_allocated: params.bits_allocated,
            }
        );

        self.input.clear();
        self.input.extend_from_slice(encoded);

        // the CharLS handle is not thread safe, so it lives for one call only
        let data = CharLS::default().decode(&self.input).map_err(|e| {
            decode_error::CodecSnafu {
                codec: CODEC_NAME,
                code: None::<i32>,
                message: Some(e.to_string()),
            }
            .build()
        })?;

        Ok(DecodedFrame {
            data: Cow::Owned(data),
            info: FrameInfo::from_parameters(params),
            // CharLS writes 16-bit samples in native byte order
            byte_order: if cfg!(target_endian = "big") {
                Endianness::Big
            } else {
                Endianness::Little
            },
            truncated: false,
        })
    }

    fn describe_error(&self, code: i32) -> Option<String> {
        let message = match code {
            1 => "invalid argument",
            2 => "parameter value not supported",
            3 => "destination buffer too small",
            4 => "source buffer too small",
            5 => "invalid encoded data",
            6 => "too much encoded data",
            7 => "invalid operation",
            8 => "bit depth for transform not supported",
            9 => "color transform not supported",
            10 => "encoding not supported",
            11 => "unknown JPEG marker found",
            12 => "JPEG marker start byte not found",
            13 => "not enough memory",
            14 => "unexpected failure",
            15 => "start of image marker not found",
            16 => "unexpected marker found",
            17 => "invalid marker segment size",
            18 => "duplicate start of image marker",
            19 => "duplicate start of frame marker",
            20 => "duplicate component id in SOF segment",
            21 => "unexpected end of image marker",
            22 => "invalid JPEG-LS preset parameter type",
            23 => "JPEG-LS preset extended parameter type not supported",
            24 => "missing JPEG-LS preset parameters",
            _ => return None,
        };
        Some(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_have_messages() {
        let codec = JpegLsDecoder::new();
        assert_eq!(
            codec.describe_error(5).as_deref(),
            Some("invalid encoded data")
        );
        assert_eq!(codec.describe_error(-1), None);
    }
}
