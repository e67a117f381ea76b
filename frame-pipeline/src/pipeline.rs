//! The frame decode pipeline.
//!
//! A decode runs the frame adapter of the transfer syntax,
//! types the decoded bytes into samples,
//! resamples them onto the target grid if one was requested,
//! and finally rescales them into a buffer
//! of a numeric type which holds every output value.

use crate::attribute::ImageFrameDescriptor;
use crate::buffer::{NumericKind, PixelBuffer, TargetBuffer};
use crate::options::{DecodeConfig, DecodeOptions, DecodeRequest, PreScaleOptions};
use crate::registry::CodecRegistry;
use crate::resize::{resize_samples, Grid};
use crate::result::{checked_scale, ImageInfo, PixelFrameResult, PreScale};
use crate::sample::type_samples;
use crate::transform::{ModalityScale, ScalingParameters};
use crate::{
    CodecDecodeFailureSnafu, InvalidTargetBufferSnafu, MissingScalingParametersSnafu,
    Result, SampleCountMismatchSnafu, TargetBufferLengthMismatchSnafu, TruncatedFrameSnafu,
    UnsupportedTransferSyntaxSnafu,
};
use dicom_frame_codecs::adapters::DecodedFrame;
use dicom_frame_codecs::Codec;
use snafu::{ensure, OptionExt, ResultExt};
use std::convert::TryFrom;
use std::time::Instant;
use tracing::{debug, warn};

/// Decodes frames of any supported transfer syntax.
///
/// The pipeline owns the third party codec instances,
/// which are created on first use
/// and kept until [`shutdown`](FramePipeline::shutdown).
#[derive(Debug, Default)]
pub struct FramePipeline {
    config: DecodeConfig,
    codecs: CodecRegistry,
}

impl FramePipeline {
    pub fn new(config: DecodeConfig) -> Self {
        Self::with_registry(config, CodecRegistry::new())
    }

    /// Create a pipeline decoding through the given codec registry.
    pub fn with_registry(config: DecodeConfig, codecs: CodecRegistry) -> Self {
        FramePipeline { config, codecs }
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    /// Release all codec instances.
    pub async fn shutdown(&self) {
        self.codecs.shutdown().await
    }

    /// Decode a single frame.
    pub async fn decode(&self, request: DecodeRequest) -> Result<PixelFrameResult> {
        let start = Instant::now();
        let DecodeRequest {
            encoded,
            transfer_syntax_uid,
            descriptor,
            options,
            target_storage,
        } = request;

        let ts = dicom_frame_codecs::get(&transfer_syntax_uid).context(
            UnsupportedTransferSyntaxSnafu {
                uid: transfer_syntax_uid.trim_end_matches('\0'),
            },
        )?;

        let decode_level = match (options.decode_level, ts.codec()) {
            (Some(level), Codec::External(kind)) if kind.supports_decode_level() => Some(level),
            (Some(level), _) => {
                debug!(
                    "Decode level {} not supported by {}, decoding full resolution",
                    level,
                    ts.name()
                );
                None
            }
            (None, _) => None,
        };
        let params = descriptor.frame_parameters(decode_level);

        let frame: DecodedFrame<'_> = match ts.codec() {
            Codec::External(kind) => self.codecs.decode(*kind, encoded, params).await?,
            codec => match codec.frame_decoder() {
                Some(decoder) => decoder
                    .decode_frame(&encoded, &params)
                    .context(CodecDecodeFailureSnafu)?,
                None => return UnsupportedTransferSyntaxSnafu { uid: ts.uid() }.fail(),
            },
        };

        let external = matches!(ts.codec(), Codec::External(_));
        let mut result = self.normalize(frame, external, &descriptor, &options, target_storage)?;
        result.decode_time_ms = start.elapsed().as_secs_f64() * 1000.;
        debug!(
            "Decoded {}x{} {} frame in {:.2} ms",
            result.image_info.columns,
            result.image_info.rows,
            ts.name(),
            result.decode_time_ms
        );
        Ok(result)
    }

    /// Turn a decoded frame into the final result.
    fn normalize(
        &self,
        frame: DecodedFrame<'_>,
        external: bool,
        descriptor: &ImageFrameDescriptor,
        options: &DecodeOptions,
        target_storage: Option<Vec<u8>>,
    ) -> Result<PixelFrameResult> {
        if frame.truncated {
            warn!("Frame was only partially decoded, missing samples are zero");
            ensure!(!options.reject_truncated, TruncatedFrameSnafu);
        }

        // dimensions reported by the codec take precedence
        let rows = u16::try_from(frame.info.height)
            .ok()
            .filter(|v| *v > 0)
            .unwrap_or(descriptor.rows);
        let columns = u16::try_from(frame.info.width)
            .ok()
            .filter(|v| *v > 0)
            .unwrap_or(descriptor.columns);
        let components = match frame.info.component_count {
            0 => descriptor.samples_per_pixel,
            n => n,
        };
        if (rows, columns) != (descriptor.rows, descriptor.columns) {
            debug!(
                "Codec reported {}x{}, frame descriptor says {}x{}",
                columns, rows, descriptor.columns, descriptor.rows
            );
        }

        let bits_allocated = descriptor.bits_allocated;
        let packed = bits_allocated == 1;
        let mut samples = type_samples(
            &frame.data,
            bits_allocated,
            descriptor.is_signed(),
            frame.byte_order,
            descriptor.float_pixel_data,
        )?;

        let sample_count = rows as usize * columns as usize * components as usize;
        let expected = if packed {
            (sample_count + 7) / 8
        } else {
            sample_count
        };
        ensure!(
            samples.len() == expected,
            SampleCountMismatchSnafu {
                expected,
                actual: samples.len(),
            }
        );

        if descriptor.is_signed() && descriptor.bits_stored < bits_allocated {
            samples.sign_extend(descriptor.bits_stored);
        }

        let target = options.target_buffer.clone().unwrap_or_default();
        let (dst_rows, dst_columns) = (
            target.rows.unwrap_or(rows),
            target.columns.unwrap_or(columns),
        );
        let (rows, columns) = if (dst_rows, dst_columns) == (rows, columns) {
            (rows, columns)
        } else if packed {
            warn!("Resampling of 1-bit frames is not supported, keeping the decoded grid");
            (rows, columns)
        } else {
            debug!(
                "Resampling {}x{} to {}x{} ({:?})",
                columns, rows, dst_columns, dst_rows, options.scaling_type
            );
            let grid = Grid {
                rows: rows.into(),
                columns: columns.into(),
                components: components.into(),
                // third party codecs always interleave their output
                planar: descriptor.planar_configuration == 1 && !external,
            };
            samples = resize_samples(
                &samples,
                grid,
                dst_rows.into(),
                dst_columns.into(),
                options.scaling_type,
            );
            (dst_rows, dst_columns)
        };

        let (min, max) = if packed {
            bit_range(&frame.data, sample_count)
        } else {
            samples.min_max().unwrap_or((0., 0.))
        };

        let scale = if options.pre_scale.enabled && !packed {
            let params = scaling_parameters(descriptor, &options.pre_scale)?;
            checked_scale(&params, "frame descriptor", options.allow_float_rendering)?
        } else {
            None
        };
        let (min, max) = match &scale {
            Some(scale) => scale.apply_range(min, max),
            None => (min, max),
        };

        if let Some(length) = target.length {
            ensure!(
                length == samples.len(),
                TargetBufferLengthMismatchSnafu {
                    requested: length,
                    decoded: samples.len(),
                }
            );
        }

        let (kind, fallback) = if packed {
            (NumericKind::U8, false)
        } else {
            self.select_kind(&target, descriptor, scale.as_ref(), min, max)?
        };

        let pixel_data = PixelBuffer::from_samples(&samples, kind, scale);

        let target_storage = match target_storage {
            Some(storage) if fallback => {
                debug!("Target buffer left untouched");
                Some(storage)
            }
            Some(mut storage) => {
                write_target(&mut storage, &target, &pixel_data)?;
                Some(storage)
            }
            None => None,
        };

        let image_info = ImageInfo {
            rows,
            columns,
            bits_per_pixel: 1,
            signed: false,
            bytes_per_pixel: 1,
            components_per_pixel: components,
        };
        let image_info = if packed {
            image_info
        } else {
            image_info.with_kind(kind, min)
        };

        Ok(PixelFrameResult {
            pixel_data,
            image_info,
            smallest_pixel_value: min,
            largest_pixel_value: max,
            decode_time_ms: 0.,
            pre_scale: PreScale {
                enabled: options.pre_scale.enabled,
                scaled: scale.is_some(),
            },
            truncated: frame.truncated,
            target_storage,
        })
    }

    /// Choose the numeric kind of the output buffer.
    ///
    /// Returns the kind and whether the requested kind
    /// had to be abandoned for floating point.
    fn select_kind(
        &self,
        target: &TargetBuffer,
        descriptor: &ImageFrameDescriptor,
        scale: Option<&ModalityScale>,
        min: f64,
        max: f64,
    ) -> Result<(NumericKind, bool)> {
        let integral = scale.map_or(true, ModalityScale::is_integral);
        let natural = if integral {
            NumericKind::for_range(min, max)
        } else {
            NumericKind::F32
        };

        let requested = match target.kind {
            None => return Ok((natural, false)),
            Some(kind) => kind,
        };
        ensure!(
            !requested.is_16bit() || self.config.use_16bit_data_type,
            InvalidTargetBufferSnafu {
                reason: format!("{} target requires 16-bit data types to be enabled", requested),
            }
        );
        if descriptor.is_color() && target.byte_offset.is_none() {
            debug!("Ignoring target kind {} for color frame", requested);
            return Ok((natural, false));
        }
        if requested.can_represent(min, max) && (integral || requested == NumericKind::F32) {
            Ok((requested, false))
        } else {
            warn!(
                "Target kind {} cannot hold sample range {}..={}, falling back to f32",
                requested, min, max
            );
            Ok((NumericKind::F32, true))
        }
    }
}

/// Gather the scaling parameters of a decode,
/// options taking precedence over the frame descriptor.
fn scaling_parameters(
    descriptor: &ImageFrameDescriptor,
    pre_scale: &PreScaleOptions,
) -> Result<ScalingParameters> {
    let base = descriptor.scaling_parameters();
    match &pre_scale.scaling_parameters {
        Some(overrides) => {
            if let Some(parameter) = overrides.non_numeric_parameter() {
                return MissingScalingParametersSnafu {
                    source_name: "pre-scale options",
                    parameter,
                }
                .fail();
            }
            Ok(base.merged_with(overrides))
        }
        None => Ok(base),
    }
}

/// The range of the first `count` bits of a packed 1-bit frame.
fn bit_range(data: &[u8], count: usize) -> (f64, f64) {
    let full = count / 8;
    let mut ones = false;
    let mut zeros = false;
    for &byte in &data[..full.min(data.len())] {
        ones |= byte != 0;
        zeros |= byte != 0xFF;
    }
    if let Some(&last) = data.get(full).filter(|_| count % 8 != 0) {
        let mask = (1_u8 << (count % 8)) - 1;
        ones |= last & mask != 0;
        zeros |= last & mask != mask;
    }
    match (zeros, ones) {
        (_, false) => (0., 0.),
        (false, true) => (1., 1.),
        (true, true) => (0., 1.),
    }
}

/// Copy the output samples into the caller's storage.
fn write_target(storage: &mut [u8], target: &TargetBuffer, pixels: &PixelBuffer) -> Result<()> {
    let offset = target.byte_offset.unwrap_or(0);
    let width = pixels.kind().bytes();
    ensure!(
        offset % width == 0,
        InvalidTargetBufferSnafu {
            reason: format!("byte offset {} is not a multiple of {}", offset, width),
        }
    );
    let bytes = pixels.as_bytes();
    let end = offset + bytes.len();
    let storage_len = storage.len();
    let destination = storage
        .get_mut(offset..end)
        .with_context(|| InvalidTargetBufferSnafu {
            reason: format!(
                "{} bytes at offset {} do not fit in storage of {} bytes",
                bytes.len(),
                offset,
                storage_len
            ),
        })?;
    destination.copy_from_slice(bytes);
    Ok(())
}
