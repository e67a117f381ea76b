//! Private module for pixel sample value transformation functions.

use crate::attribute::Modality;

/// Description of a modality rescale function,
/// defined by a _rescale slope_ and _rescale intercept_.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rescale {
    /// the rescale slope
    pub slope: f64,
    /// the rescale intercept
    pub intercept: f64,
}

impl Rescale {
    /// Create a new rescale function.
    #[inline]
    pub fn new(slope: f64, intercept: f64) -> Self {
        Rescale { slope, intercept }
    }

    /// Apply the rescale function to a value.
    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        self.slope * value + self.intercept
    }
}

/// The values a rescale may be computed from.
///
/// Every field is optional:
/// a missing value is treated the same as a non-numeric one,
/// except that a NaN is rejected when pre-scaling is requested.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScalingParameters {
    pub rescale_slope: Option<f64>,
    pub rescale_intercept: Option<f64>,
    pub modality: Option<Modality>,
    pub dose_grid_scaling: Option<f64>,
    pub suvbw: Option<f64>,
}

impl ScalingParameters {
    /// Overlay `overrides` on top of these parameters, field by field.
    pub fn merged_with(&self, overrides: &ScalingParameters) -> ScalingParameters {
        ScalingParameters {
            rescale_slope: overrides.rescale_slope.or(self.rescale_slope),
            rescale_intercept: overrides.rescale_intercept.or(self.rescale_intercept),
            modality: overrides.modality.clone().or_else(|| self.modality.clone()),
            dose_grid_scaling: overrides.dose_grid_scaling.or(self.dose_grid_scaling),
            suvbw: overrides.suvbw.or(self.suvbw),
        }
    }

    /// Iterate over the numeric fields by attribute keyword.
    fn values(&self) -> [(&'static str, Option<f64>); 4] {
        [
            ("RescaleSlope", self.rescale_slope),
            ("RescaleIntercept", self.rescale_intercept),
            ("DoseGridScaling", self.dose_grid_scaling),
            ("SUVbw", self.suvbw),
        ]
    }

    /// The keyword of the first parameter holding a NaN, if any.
    pub fn non_numeric_parameter(&self) -> Option<&'static str> {
        self.values()
            .iter()
            .find(|(_, v)| v.map_or(false, f64::is_nan))
            .map(|(name, _)| *name)
    }

    /// Whether there is no numeric parameter at all.
    pub fn is_empty(&self) -> bool {
        self.values().iter().all(|(_, v)| v.is_none())
    }
}

/// A resolved modality aware rescale function.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ModalityScale {
    /// `suvbw * (raw * slope + intercept)`
    Suv { rescale: Rescale, suvbw: f64 },
    /// `raw * dose_grid_scaling`
    Dose { dose_grid_scaling: f64 },
    /// `raw * slope + intercept`
    Linear(Rescale),
}

impl ModalityScale {
    /// Pick the rescale function for the given parameters,
    /// or `None` if they do not resolve to any.
    ///
    /// PET frames missing a slope or intercept
    /// use the identity values for them.
    pub fn resolve(params: &ScalingParameters) -> Option<Self> {
        let numeric = |v: Option<f64>| v.filter(|v| !v.is_nan());
        let slope = numeric(params.rescale_slope);
        let intercept = numeric(params.rescale_intercept);

        match (&params.modality, numeric(params.suvbw), numeric(params.dose_grid_scaling)) {
            (Some(Modality::Pt), Some(suvbw), _) => Some(ModalityScale::Suv {
                rescale: Rescale::new(slope.unwrap_or(1.), intercept.unwrap_or(0.)),
                suvbw,
            }),
            (Some(Modality::RtDose), _, Some(dose_grid_scaling)) => {
                Some(ModalityScale::Dose { dose_grid_scaling })
            }
            _ => match (slope, intercept) {
                (Some(slope), Some(intercept)) => {
                    Some(ModalityScale::Linear(Rescale::new(slope, intercept)))
                }
                _ => None,
            },
        }
    }

    /// Apply the function to a raw sample value.
    #[inline]
    pub fn apply(&self, raw: f64) -> f64 {
        match self {
            ModalityScale::Suv { rescale, suvbw } => suvbw * rescale.apply(raw),
            ModalityScale::Dose { dose_grid_scaling } => raw * dose_grid_scaling,
            ModalityScale::Linear(rescale) => rescale.apply(raw),
        }
    }

    /// Map the range of raw values to the range of output values.
    ///
    /// All functions are affine,
    /// so the bounds map to the bounds,
    /// swapped when the function is decreasing.
    pub fn apply_range(&self, min: f64, max: f64) -> (f64, f64) {
        let a = self.apply(min);
        let b = self.apply(max);
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Whether integer inputs always map to integer outputs.
    pub fn is_integral(&self) -> bool {
        let integral = |v: f64| v.fract() == 0.;
        match self {
            ModalityScale::Suv { rescale, suvbw } => {
                integral(rescale.slope) && integral(rescale.intercept) && integral(*suvbw)
            }
            ModalityScale::Dose { dose_grid_scaling } => integral(*dose_grid_scaling),
            ModalityScale::Linear(rescale) => integral(rescale.slope) && integral(rescale.intercept),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ScalingParameters {
        ScalingParameters::default()
    }

    #[test]
    fn suv_scaling() {
        let scale = ModalityScale::resolve(&ScalingParameters {
            rescale_slope: Some(1.),
            rescale_intercept: Some(0.),
            modality: Some(Modality::Pt),
            suvbw: Some(2.5),
            ..params()
        })
        .unwrap();
        assert_eq!(scale.apply(100.), 250.0);
        assert!(!scale.is_integral());
    }

    #[test]
    fn dose_scaling() {
        let scale = ModalityScale::resolve(&ScalingParameters {
            rescale_slope: Some(1.),
            rescale_intercept: Some(0.),
            modality: Some(Modality::RtDose),
            dose_grid_scaling: Some(0.001),
            ..params()
        })
        .unwrap();
        assert!((scale.apply(10.) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn linear_scaling() {
        let scale = ModalityScale::resolve(&ScalingParameters {
            rescale_slope: Some(2.),
            rescale_intercept: Some(-10.),
            ..params()
        })
        .unwrap();
        assert_eq!(scale, ModalityScale::Linear(Rescale::new(2., -10.)));
        assert_eq!(scale.apply(50.), 90.);
        assert!(scale.is_integral());
    }

    #[test]
    fn modality_without_its_factor_falls_back_to_linear() {
        let scale = ModalityScale::resolve(&ScalingParameters {
            rescale_slope: Some(1.),
            rescale_intercept: Some(-1024.),
            modality: Some(Modality::Pt),
            ..params()
        });
        assert_eq!(
            scale,
            Some(ModalityScale::Linear(Rescale::new(1., -1024.)))
        );
    }

    #[test]
    fn partial_parameters_do_not_resolve() {
        let p = ScalingParameters {
            rescale_slope: Some(2.),
            ..params()
        };
        assert_eq!(ModalityScale::resolve(&p), None);
        assert!(!p.is_empty());
        assert!(params().is_empty());
    }

    #[test]
    fn negative_slope_range_is_ordered() {
        let scale = ModalityScale::Linear(Rescale::new(-1., 100.));
        assert_eq!(scale.apply_range(0., 50.), (50., 100.));
    }

    #[test]
    fn overrides_take_precedence() {
        let base = ScalingParameters {
            rescale_slope: Some(1.),
            rescale_intercept: Some(0.),
            modality: Some(Modality::Pt),
            ..params()
        };
        let merged = base.merged_with(&ScalingParameters {
            rescale_intercept: Some(5.),
            suvbw: Some(f64::NAN),
            ..params()
        });
        assert_eq!(merged.rescale_slope, Some(1.));
        assert_eq!(merged.rescale_intercept, Some(5.));
        assert_eq!(merged.modality, Some(Modality::Pt));
        assert_eq!(merged.non_numeric_parameter(), Some("SUVbw"));
    }
}
