//! Support for JPEG image decoding.

use crate::adapters::{
    decode_error, DecodeResult, DecodedFrame, ExternalCodec, FrameInfo, FrameParameters,
};
use byteordered::Endianness;
use jpeg_decoder::{Decoder, PixelFormat};
use snafu::{ensure, OptionExt};
use std::borrow::Cow;

const CODEC_NAME: &str = "JPEG";

/// Frame decoder for JPEG baseline, extended and lossless
/// transfer syntaxes.
#[derive(Debug, Default)]
pub struct JpegDecoder {
    input: Vec<u8>,
}

impl JpegDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExternalCodec for JpegDecoder {
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

        let mut decoder = Decoder::new(&self.input[..]);
        let data = decoder
            .decode()
            .map_err(|e| {
                decode_error::CodecSnafu {
                    codec: CODEC_NAME,
                    code: None::<i32>,
                    message: Some(e.to_string()),
                }
                .build()
            })?;
        let info = decoder.info().context(decode_error::CodecSnafu {
            codec: CODEC_NAME,
            code: None::<i32>,
            message: Some("missing image information after decoding".to_string()),
        })?;

        // 16-bit output of the decoder is big endian
        #[allow(unreachable_patterns)]
        let (component_count, bits_per_sample, byte_order) = match info.pixel_format {
            PixelFormat::L8 => (1, 8, Endianness::Little),
            PixelFormat::L16 => (1, 16, Endianness::Big),
            PixelFormat::RGB24 => (3, 8, Endianness::Little),
            PixelFormat::CMYK32 => (4, 8, Endianness::Little),
            _ => (params.samples_per_pixel, params.bits_allocated, Endianness::Little),
        };

        Ok(DecodedFrame {
            data: Cow::Owned(data),
            info: FrameInfo {
                width: info.width.into(),
                height: info.height.into(),
                bits_per_sample,
                component_count,
            },
            byte_order,
            truncated: false,
        })
    }
}
