//! The outcome of a frame decode.

use crate::buffer::{NumericKind, PixelBuffer};
use crate::transform::{ModalityScale, ScalingParameters};
use crate::{MissingScalingParametersSnafu, Result};
use snafu::ensure;
use tracing::debug;

/// Summary of the output image.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub struct ImageInfo {
    pub rows: u16,
    pub columns: u16,
    pub bits_per_pixel: u16,
    pub signed: bool,
    pub bytes_per_pixel: u16,
    pub components_per_pixel: u16,
}

impl ImageInfo {
    /// Update the sample layout to the output buffer's numeric kind.
    pub(crate) fn with_kind(mut self, kind: NumericKind, smallest: f64) -> Self {
        self.bits_per_pixel = (kind.bytes() * 8) as u16;
        self.bytes_per_pixel = kind.bytes() as u16;
        self.signed = match kind {
            NumericKind::I8 | NumericKind::I16 => true,
            NumericKind::F32 => smallest < 0.,
            _ => false,
        };
        self
    }
}

/// Whether pre-scaling was requested and whether it took place.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub struct PreScale {
    pub enabled: bool,
    pub scaled: bool,
}

/// A decoded and normalized frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelFrameResult {
    /// the output samples
    pub pixel_data: PixelBuffer,
    pub image_info: ImageInfo,
    pub smallest_pixel_value: f64,
    pub largest_pixel_value: f64,
    /// wall clock time of the decode, in milliseconds
    pub decode_time_ms: f64,
    pub pre_scale: PreScale,
    /// whether the codec could only partially decode the frame
    pub truncated: bool,
    /// The caller's target storage, holding the samples
    /// as of the decode.
    pub target_storage: Option<Vec<u8>>,
}

impl PixelFrameResult {
    /// Apply the modality rescale to a frame which was decoded
    /// without pre-scaling.
    ///
    /// Does nothing if the frame is already scaled.
    /// The frame stays unscaled if the parameters
    /// do not resolve to a rescale function,
    /// or if they are fractional and float rendering is not allowed.
    /// The target storage returned with the frame is not updated.
    pub fn rescale(
        &mut self,
        params: &ScalingParameters,
        allow_float_rendering: bool,
    ) -> Result<()> {
        if self.pre_scale.scaled {
            debug!("Frame already rescaled, ignoring");
            return Ok(());
        }
        self.pre_scale.enabled = true;
        if self.image_info.bits_per_pixel == 1 {
            return Ok(());
        }

        let Some(scale) = checked_scale(params, "pre-scale options", allow_float_rendering)? else {
            return Ok(());
        };

        let (min, max) = scale.apply_range(self.smallest_pixel_value, self.largest_pixel_value);
        let kind = if scale.is_integral() {
            NumericKind::for_range(min, max)
        } else {
            NumericKind::F32
        };
        self.pixel_data = self.pixel_data.converted(kind, Some(scale));
        self.smallest_pixel_value = min;
        self.largest_pixel_value = max;
        self.image_info = self.image_info.with_kind(kind, min);
        self.pre_scale.scaled = true;
        Ok(())
    }
}

/// Validate the scaling parameters and resolve their rescale function.
///
/// Fails if a parameter is NaN or if there are no parameters at all.
/// Gives `None` if they do not resolve,
/// or if the function is fractional and float rendering is not allowed.
pub(crate) fn checked_scale(
    params: &ScalingParameters,
    source_name: &'static str,
    allow_float_rendering: bool,
) -> Result<Option<ModalityScale>> {
    if let Some(parameter) = params.non_numeric_parameter() {
        return MissingScalingParametersSnafu {
            source_name,
            parameter,
        }
        .fail();
    }
    ensure!(
        !params.is_empty(),
        MissingScalingParametersSnafu {
            source_name,
            parameter: "RescaleSlope",
        }
    );

    let Some(scale) = ModalityScale::resolve(params) else {
        debug!("Scaling parameters do not resolve to a rescale, skipping");
        return Ok(None);
    };
    if !allow_float_rendering && !scale.is_integral() {
        debug!("Rescale needs float rendering, skipping");
        return Ok(None);
    }
    Ok(Some(scale))
}
