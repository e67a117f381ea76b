//! Key image attributes of a frame,
//! as extracted upstream from the DICOM data set.

use crate::transform::ScalingParameters;
use dicom_frame_codecs::adapters::FrameParameters;
use snafu::Snafu;
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum AttributeError {
    #[snafu(display("Semantically invalid value `{}` for attribute `{}`", value, name))]
    InvalidValue { name: &'static str, value: String },
}

/// A decoded representation of the DICOM _Pixel Representation_ attribute.
#[derive(Debug, Default, Copy, Clone, Eq, Hash, PartialEq)]
#[repr(u16)]
pub enum PixelRepresentation {
    /// unsigned pixel data sample values
    #[default]
    Unsigned = 0,
    /// signed pixel data sample values
    Signed = 1,
}

impl TryFrom<u16> for PixelRepresentation {
    type Error = AttributeError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PixelRepresentation::Unsigned),
            1 => Ok(PixelRepresentation::Signed),
            _ => InvalidValueSnafu {
                name: "PixelRepresentation",
                value: value.to_string(),
            }
            .fail(),
        }
    }
}

/// A decoded representation of the DICOM _Photometric Interpretation_ attribute.
#[derive(Debug, Default, Clone, Eq, Hash, PartialEq)]
pub enum PhotometricInterpretation {
    Monochrome1,
    #[default]
    Monochrome2,
    PaletteColor,
    Rgb,
    YbrFull,
    YbrFull422,
    YbrPartial420,
    YbrIct,
    YbrRct,
    Other(String),
}

impl PhotometricInterpretation {
    /// Whether samples of this interpretation describe color.
    pub fn is_color(&self) -> bool {
        !matches!(
            self,
            PhotometricInterpretation::Monochrome1 | PhotometricInterpretation::Monochrome2
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            PhotometricInterpretation::Monochrome1 => "MONOCHROME1",
            PhotometricInterpretation::Monochrome2 => "MONOCHROME2",
            PhotometricInterpretation::PaletteColor => "PALETTE COLOR",
            PhotometricInterpretation::Rgb => "RGB",
            PhotometricInterpretation::YbrFull => "YBR_FULL",
            PhotometricInterpretation::YbrFull422 => "YBR_FULL_422",
            PhotometricInterpretation::YbrPartial420 => "YBR_PARTIAL_420",
            PhotometricInterpretation::YbrIct => "YBR_ICT",
            PhotometricInterpretation::YbrRct => "YBR_RCT",
            PhotometricInterpretation::Other(s) => s,
        }
    }
}

impl FromStr for PhotometricInterpretation {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim_end_matches(|c| c == ' ' || c == '\0') {
            "MONOCHROME1" => PhotometricInterpretation::Monochrome1,
            "MONOCHROME2" => PhotometricInterpretation::Monochrome2,
            "PALETTE COLOR" => PhotometricInterpretation::PaletteColor,
            "RGB" => PhotometricInterpretation::Rgb,
            "YBR_FULL" => PhotometricInterpretation::YbrFull,
            "YBR_FULL_422" => PhotometricInterpretation::YbrFull422,
            "YBR_PARTIAL_420" => PhotometricInterpretation::YbrPartial420,
            "YBR_ICT" => PhotometricInterpretation::YbrIct,
            "YBR_RCT" => PhotometricInterpretation::YbrRct,
            other => PhotometricInterpretation::Other(other.to_string()),
        })
    }
}

impl fmt::Display for PhotometricInterpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The _Modality_ of the image,
/// as far as rescaling is concerned.
#[derive(Debug, Clone, Eq, Hash, PartialEq)]
pub enum Modality {
    /// positron emission tomography, eligible for SUV scaling
    Pt,
    /// radiotherapy dose, eligible for dose grid scaling
    RtDose,
    Other(String),
}

impl From<&str> for Modality {
    fn from(s: &str) -> Self {
        match s.trim_end_matches(|c| c == ' ' || c == '\0') {
            "PT" => Modality::Pt,
            "RTDOSE" => Modality::RtDose,
            other => Modality::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modality::Pt => f.write_str("PT"),
            Modality::RtDose => f.write_str("RTDOSE"),
            Modality::Other(s) => f.write_str(s),
        }
    }
}

/// Per-frame image metadata,
/// immutable for the duration of one decode.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFrameDescriptor {
    pub rows: u16,
    pub columns: u16,
    pub samples_per_pixel: u16,
    pub bits_allocated: u16,
    pub bits_stored: u16,
    pub pixel_representation: PixelRepresentation,
    pub photometric_interpretation: PhotometricInterpretation,
    /// 0 for interleaved samples, 1 for separate planes
    pub planar_configuration: u16,
    pub modality: Option<Modality>,
    pub rescale_slope: Option<f64>,
    pub rescale_intercept: Option<f64>,
    pub dose_grid_scaling: Option<f64>,
    pub suvbw: Option<f64>,
    /// whether the samples are IEEE floats (_Float Pixel Data_)
    pub float_pixel_data: bool,
}

impl ImageFrameDescriptor {
    /// Describe a single sample, unsigned, monochrome frame.
    pub fn new(rows: u16, columns: u16, bits_allocated: u16) -> Self {
        ImageFrameDescriptor {
            rows,
            columns,
            samples_per_pixel: 1,
            bits_allocated,
            bits_stored: bits_allocated,
            pixel_representation: PixelRepresentation::Unsigned,
            photometric_interpretation: PhotometricInterpretation::Monochrome2,
            planar_configuration: 0,
            modality: None,
            rescale_slope: None,
            rescale_intercept: None,
            dose_grid_scaling: None,
            suvbw: None,
            float_pixel_data: false,
        }
    }

    pub fn with_samples_per_pixel(mut self, samples_per_pixel: u16) -> Self {
        self.samples_per_pixel = samples_per_pixel;
        self
    }

    pub fn with_bits_stored(mut self, bits_stored: u16) -> Self {
        self.bits_stored = bits_stored;
        self
    }

    pub fn with_pixel_representation(mut self, pixel_representation: PixelRepresentation) -> Self {
        self.pixel_representation = pixel_representation;
        self
    }

    pub fn with_photometric_interpretation(
        mut self,
        photometric_interpretation: PhotometricInterpretation,
    ) -> Self {
        self.photometric_interpretation = photometric_interpretation;
        self
    }

    pub fn with_planar_configuration(mut self, planar_configuration: u16) -> Self {
        self.planar_configuration = planar_configuration;
        self
    }

    pub fn with_modality(mut self, modality: impl Into<Modality>) -> Self {
        self.modality = Some(modality.into());
        self
    }

    pub fn with_rescale(mut self, slope: f64, intercept: f64) -> Self {
        self.rescale_slope = Some(slope);
        self.rescale_intercept = Some(intercept);
        self
    }

    pub fn with_dose_grid_scaling(mut self, dose_grid_scaling: f64) -> Self {
        self.dose_grid_scaling = Some(dose_grid_scaling);
        self
    }

    pub fn with_suvbw(mut self, suvbw: f64) -> Self {
        self.suvbw = Some(suvbw);
        self
    }

    pub fn with_float_pixel_data(mut self, float_pixel_data: bool) -> Self {
        self.float_pixel_data = float_pixel_data;
        self
    }

    #[inline]
    pub fn is_signed(&self) -> bool {
        self.pixel_representation == PixelRepresentation::Signed
    }

    /// Whether this frame holds color samples.
    pub fn is_color(&self) -> bool {
        self.samples_per_pixel > 1 || self.photometric_interpretation.is_color()
    }

    /// Number of samples in the frame.
    pub fn sample_count(&self) -> usize {
        self.rows as usize * self.columns as usize * self.samples_per_pixel as usize
    }

    /// The rescale parameters recorded in the frame.
    pub fn scaling_parameters(&self) -> ScalingParameters {
        ScalingParameters {
            rescale_slope: self.rescale_slope,
            rescale_intercept: self.rescale_intercept,
            modality: self.modality.clone(),
            dose_grid_scaling: self.dose_grid_scaling,
            suvbw: self.suvbw,
        }
    }

    /// The parameters a frame adapter needs.
    pub fn frame_parameters(&self, decode_level: Option<u32>) -> FrameParameters {
        FrameParameters {
            rows: self.rows,
            columns: self.columns,
            samples_per_pixel: self.samples_per_pixel,
            bits_allocated: self.bits_allocated,
            bits_stored: self.bits_stored,
            signed: self.is_signed(),
            planar_configuration: self.planar_configuration,
            decode_level,
        }
    }
}
