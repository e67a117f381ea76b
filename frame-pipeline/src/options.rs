//! Decode request and option types.

use crate::attribute::ImageFrameDescriptor;
use crate::buffer::TargetBuffer;
use crate::resize::ScalingType;
use crate::transform::ScalingParameters;

/// Options for pre-scaling the output samples
/// with the modality rescale.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PreScaleOptions {
    /// whether to rescale the samples while decoding
    pub enabled: bool,
    /// parameters overriding those of the frame descriptor
    pub scaling_parameters: Option<ScalingParameters>,
}

/// Options of a single frame decode.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOptions {
    /// Whether the output may be floating point.
    /// When false, a rescale with fractional parameters is skipped.
    pub allow_float_rendering: bool,
    pub pre_scale: PreScaleOptions,
    pub target_buffer: Option<TargetBuffer>,
    /// how to resample onto a target grid of other dimensions
    pub scaling_type: ScalingType,
    /// resolution reduction level, honored by HTJ2K codecs only
    pub decode_level: Option<u32>,
    /// Whether to fail on frames the codec could only partially decode,
    /// instead of returning them zero filled.
    pub reject_truncated: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            allow_float_rendering: true,
            pre_scale: PreScaleOptions::default(),
            target_buffer: None,
            scaling_type: ScalingType::default(),
            decode_level: None,
            reject_truncated: false,
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_float_rendering(mut self, allow: bool) -> Self {
        self.allow_float_rendering = allow;
        self
    }

    /// Enable pre-scaling with the parameters of the frame descriptor.
    pub fn with_pre_scale(mut self) -> Self {
        self.pre_scale.enabled = true;
        self
    }

    /// Enable pre-scaling, overriding parameters of the frame descriptor.
    pub fn with_scaling_parameters(mut self, params: ScalingParameters) -> Self {
        self.pre_scale = PreScaleOptions {
            enabled: true,
            scaling_parameters: Some(params),
        };
        self
    }

    pub fn with_target_buffer(mut self, target: TargetBuffer) -> Self {
        self.target_buffer = Some(target);
        self
    }

    pub fn with_scaling_type(mut self, scaling_type: ScalingType) -> Self {
        self.scaling_type = scaling_type;
        self
    }

    pub fn with_decode_level(mut self, level: u32) -> Self {
        self.decode_level = Some(level);
        self
    }

    pub fn with_reject_truncated(mut self, reject: bool) -> Self {
        self.reject_truncated = reject;
        self
    }
}

/// Loader wide decode settings,
/// shared by every request of a pipeline.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
pub struct DecodeConfig {
    /// whether 16-bit target buffers are accepted
    pub use_16bit_data_type: bool,
}

/// A request to decode a single frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeRequest {
    /// the encoded frame, exactly as stored in the pixel data
    pub encoded: Vec<u8>,
    pub transfer_syntax_uid: String,
    pub descriptor: ImageFrameDescriptor,
    pub options: DecodeOptions,
    /// backing storage for the target buffer
    pub target_storage: Option<Vec<u8>>,
}

impl DecodeRequest {
    pub fn new(
        encoded: impl Into<Vec<u8>>,
        transfer_syntax_uid: impl Into<String>,
        descriptor: ImageFrameDescriptor,
    ) -> Self {
        DecodeRequest {
            encoded: encoded.into(),
            transfer_syntax_uid: transfer_syntax_uid.into(),
            descriptor,
            options: DecodeOptions::default(),
            target_storage: None,
        }
    }

    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Provide storage for the samples,
    /// to be filled as described by the target buffer options.
    pub fn with_target_storage(mut self, storage: Vec<u8>) -> Self {
        self.target_storage = Some(storage);
        self
    }
}
