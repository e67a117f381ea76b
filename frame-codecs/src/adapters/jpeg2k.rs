//! Support for JPEG 2000 and HTJ2K image decoding.

use crate::adapters::{
    decode_error, DecodeResult, DecodedFrame, ExternalCodec, FrameInfo, FrameParameters,
};
use byteordered::Endianness;
use jpeg2k::{DecodeParameters, Image};
use snafu::ensure;
use std::borrow::Cow;
use tracing::warn;

// Check jpeg2k backend conflicts
#[cfg(all(feature = "openjp2", feature = "openjpeg-sys"))]
compile_error!(
    "feature \"openjp2\" and feature \"openjpeg-sys\" cannot be enabled at the same time"
);

/// Frame decoder for transfer syntaxes based on JPEG 2000,
/// including High-Throughput JPEG 2000.
///
/// Supports decoding at a reduced resolution level
/// through [`FrameParameters::decode_level`].
#[derive(Debug)]
pub struct Jpeg2000Decoder {
    name: &'static str,
    input: Vec<u8>,
}

impl Jpeg2000Decoder {
    /// Decoder for JPEG 2000 part 1 code streams.
    pub fn jpeg2000() -> Self {
        Jpeg2000Decoder {
            name: "JPEG 2000",
            input: Vec::new(),
        }
    }

    /// Decoder for High-Throughput JPEG 2000 code streams.
    pub fn htj2k() -> Self {
        Jpeg2000Decoder {
            name: "HTJ2K",
            input: Vec::new(),
        }
    }
}

impl ExternalCodec for Jpeg2000Decoder {
    fn name(&self) -> &'static str {
        self.name
    }

    fn decode(
        &mut self,
        encoded: &[u8],
        params: &FrameParameters,
    ) -> DecodeResult<DecodedFrame<'static>> {
        ensure!(
            matches!(params.bits_allocated, 8 | 16 | 32),
            decode_error::UnsupportedBitsAllocatedSnafu {
                codec: self.name,
                bits_allocated: params.bits_allocated,
            }
        );

        self.input.clear();
        self.input.extend_from_slice(encoded);

        let mut decode_parameters = DecodeParameters::new();
        if let Some(level) = params.decode_level {
            decode_parameters = decode_parameters.reduce(level);
        }
        let image = Image::from_bytes_with(&self.input, decode_parameters).map_err(|e| {
            decode_error::CodecSnafu {
                codec: self.name,
                code: None::<i32>,
                message: Some(e.to_string()),
            }
            .build()
        })?;

        // Note: we cannot use `get_pixels`
        // because the current implementation narrows the data
        // down to 8 bits per sample
        let components = image.components();
        let Some(first) = components.first() else {
            return decode_error::CodecSnafu {
                codec: self.name,
                code: None::<i32>,
                message: Some("image has no components".to_string()),
            }
            .fail();
        };
        // reduced resolution levels shrink the frame
        let width = first.width();
        let height = first.height();

        let samples_per_pixel = params.samples_per_pixel.max(1) as usize;
        let bytes_per_sample = params.bytes_per_sample();
        let pixel_count = width as usize * height as usize;
        let mut data = vec![0_u8; pixel_count * samples_per_pixel * bytes_per_sample];

        // write each component in standard layout
        for (component_i, component) in components.iter().enumerate() {
            if component_i >= samples_per_pixel {
                warn!(
                    "{} image has more components than expected ({} > {})",
                    self.name,
                    components.len(),
                    samples_per_pixel
                );
                break;
            }

            for (i, sample) in component.data().iter().take(pixel_count).enumerate() {
                let offset = (i * samples_per_pixel + component_i) * bytes_per_sample;
                data[offset..offset + bytes_per_sample]
                    .copy_from_slice(&sample.to_le_bytes()[..bytes_per_sample]);
            }
        }

        Ok(DecodedFrame {
            data: Cow::Owned(data),
            info: FrameInfo {
                width,
                height,
                bits_per_sample: params.bits_allocated,
                component_count: samples_per_pixel as u16,
            },
            byte_order: Endianness::Little,
            truncated: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_is_a_codec_failure() {
        let params = FrameParameters {
            rows: 2,
            columns: 2,
            samples_per_pixel: 1,
            bits_allocated: 16,
            bits_stored: 12,
            signed: false,
            planar_configuration: 0,
            decode_level: Some(1),
        };
        let err = Jpeg2000Decoder::htj2k()
            .decode(&[0x01, 0x02, 0x03], &params)
            .unwrap_err();
        assert!(err.to_string().starts_with("HTJ2K decoder failure"));
    }
}
