//! A CLI tool for decoding a single DICOM pixel data frame
//! and reporting its sample type and value range.
use clap::Parser;
use dicom_frame_pipeline::{
    DecodeConfig, DecodeOptions, DecodeRequest, FramePipeline, ImageFrameDescriptor,
    NumericKind, PixelRepresentation, ScalingParameters, ScalingType, TargetBuffer,
};
use snafu::{Report, ResultExt, Whatever};
use std::path::PathBuf;
use tracing::Level;

/// Exit code for when an error emerged while reading the frame file.
const ERROR_READ: i32 = -2;
/// Exit code for when an error emerged while decoding the frame.
const ERROR_DECODE: i32 = -3;
/// Exit code for when an error emerged while writing the samples.
const ERROR_WRITE: i32 = -4;
/// Exit code for any other error.
const ERROR_OTHER: i32 = -128;

/// Decode a single encoded pixel data frame
#[derive(Debug, Parser)]
#[command(version)]
struct App {
    /// The file holding the encoded frame
    file: PathBuf,
    /// Write the output samples to this file, in native byte order
    #[clap(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// The transfer syntax UID of the frame
    #[clap(long = "ts", default_value = "1.2.840.10008.1.2.1")]
    ts: String,

    #[clap(flatten)]
    frame: FrameArgs,

    #[clap(flatten)]
    scaling: ScalingArgs,

    /// Expected numeric type of the output samples (u8, u16, u32, i8, i16, f32)
    #[clap(long = "target-kind")]
    target_kind: Option<NumericKind>,
    /// Resample onto this many rows
    #[clap(long = "target-rows")]
    target_rows: Option<u16>,
    /// Resample onto this many columns
    #[clap(long = "target-columns")]
    target_columns: Option<u16>,
    /// How to resample (bilinear or replicate)
    #[clap(long = "scaling-type", default_value = "replicate")]
    scaling_type: ScalingType,
    /// Resolution reduction level, for JPEG 2000 frames
    #[clap(long = "decode-level")]
    decode_level: Option<u32>,
    /// Fail if the frame can only be partially decoded
    #[clap(long)]
    reject_truncated: bool,
    /// Accept 16-bit target kinds
    #[clap(long = "use-16bit")]
    use_16bit_data_type: bool,

    /// Verbose mode
    #[clap(short = 'v', long = "verbose")]
    verbose: bool,
}

/// Image attributes of the frame
#[derive(Debug, Parser)]
struct FrameArgs {
    /// Rows
    #[clap(long)]
    rows: u16,
    /// Columns
    #[clap(long)]
    columns: u16,
    /// Bits Allocated
    #[clap(long = "bits-allocated", default_value_t = 16)]
    bits_allocated: u16,
    /// Bits Stored (default is Bits Allocated)
    #[clap(long = "bits-stored")]
    bits_stored: Option<u16>,
    /// Samples per Pixel
    #[clap(long = "samples-per-pixel", default_value_t = 1)]
    samples_per_pixel: u16,
    /// Samples are signed (Pixel Representation 1)
    #[clap(long)]
    signed: bool,
    /// Samples are stored in separate planes (Planar Configuration 1)
    #[clap(long)]
    planar: bool,
    /// Photometric Interpretation
    #[clap(long = "photometric", default_value = "MONOCHROME2")]
    photometric_interpretation: String,
}

/// Modality rescale of the frame
#[derive(Debug, Parser)]
struct ScalingArgs {
    /// Rescale the samples while decoding
    #[clap(long = "pre-scale")]
    pre_scale: bool,
    /// Never produce floating point samples
    #[clap(long = "no-float")]
    no_float: bool,
    /// Modality (PT and RTDOSE get their own rescale)
    #[clap(long)]
    modality: Option<String>,
    /// Rescale Slope
    #[clap(long = "slope", allow_hyphen_values = true)]
    rescale_slope: Option<f64>,
    /// Rescale Intercept
    #[clap(long = "intercept", allow_hyphen_values = true)]
    rescale_intercept: Option<f64>,
    /// Dose Grid Scaling
    #[clap(long = "dose-grid-scaling")]
    dose_grid_scaling: Option<f64>,
    /// SUV body weight factor
    #[clap(long)]
    suvbw: Option<f64>,
}

impl App {
    fn descriptor(&self) -> ImageFrameDescriptor {
        let FrameArgs {
            rows,
            columns,
            bits_allocated,
            bits_stored,
            samples_per_pixel,
            signed,
            planar,
            photometric_interpretation,
        } = &self.frame;
        let pixel_representation = if *signed {
            PixelRepresentation::Signed
        } else {
            PixelRepresentation::Unsigned
        };
        let mut descriptor = ImageFrameDescriptor::new(*rows, *columns, *bits_allocated)
            .with_bits_stored(bits_stored.unwrap_or(*bits_allocated))
            .with_samples_per_pixel(*samples_per_pixel)
            .with_pixel_representation(pixel_representation)
            .with_planar_configuration(u16::from(*planar));
        if let Ok(pi) = photometric_interpretation.parse() {
            descriptor = descriptor.with_photometric_interpretation(pi);
        }
        descriptor
    }

    fn options(&self) -> DecodeOptions {
        let ScalingArgs {
            pre_scale,
            no_float,
            modality,
            rescale_slope,
            rescale_intercept,
            dose_grid_scaling,
            suvbw,
        } = &self.scaling;

        let mut options = DecodeOptions::new()
            .with_float_rendering(!no_float)
            .with_scaling_type(self.scaling_type)
            .with_reject_truncated(self.reject_truncated);
        if *pre_scale {
            options = options.with_scaling_parameters(ScalingParameters {
                rescale_slope: *rescale_slope,
                rescale_intercept: *rescale_intercept,
                modality: modality.as_deref().map(Into::into),
                dose_grid_scaling: *dose_grid_scaling,
                suvbw: *suvbw,
            });
        }
        if let Some(level) = self.decode_level {
            options = options.with_decode_level(level);
        }
        if self.target_kind.is_some() || self.target_rows.is_some() || self.target_columns.is_some() {
            options = options.with_target_buffer(TargetBuffer {
                kind: self.target_kind,
                rows: self.target_rows,
                columns: self.target_columns,
                ..TargetBuffer::default()
            });
        }
        options
    }
}

fn main() {
    run().unwrap_or_else(|e| {
        eprintln!("{}", Report::from_error(e));
        std::process::exit(ERROR_OTHER);
    });
}

fn run() -> Result<(), Whatever> {
    let app = App::parse();

    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(if app.verbose { Level::DEBUG } else { Level::INFO })
            .finish(),
    )
    .unwrap_or_else(|e| {
        eprintln!("{}", snafu::Report::from_error(e));
    });

    let encoded = std::fs::read(&app.file).unwrap_or_else(|e| {
        eprintln!("{}", Report::from_error(e));
        std::process::exit(ERROR_READ);
    });

    let request = DecodeRequest::new(encoded, app.ts.clone(), app.descriptor())
        .with_options(app.options());
    let pipeline = FramePipeline::new(DecodeConfig {
        use_16bit_data_type: app.use_16bit_data_type,
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .build()
        .whatever_context("Could not start async runtime")?;
    let frame = runtime
        .block_on(async {
            let frame = pipeline.decode(request).await;
            pipeline.shutdown().await;
            frame
        })
        .unwrap_or_else(|e| {
            eprintln!("{}", Report::from_error(e));
            std::process::exit(ERROR_DECODE);
        });

    let info = &frame.image_info;
    println!(
        "{}x{}, {} component(s), {} samples of {}",
        info.columns,
        info.rows,
        info.components_per_pixel,
        frame.pixel_data.len(),
        frame.pixel_data.kind()
    );
    println!(
        "range: {} ..= {}",
        frame.smallest_pixel_value, frame.largest_pixel_value
    );
    println!(
        "rescaled: {}, truncated: {}, decoded in {:.3} ms",
        frame.pre_scale.scaled, frame.truncated, frame.decode_time_ms
    );

    if let Some(output) = app.output {
        std::fs::write(&output, frame.pixel_data.as_bytes()).unwrap_or_else(|e| {
            eprintln!("{}", Report::from_error(e));
            std::process::exit(ERROR_WRITE);
        });
    }

    Ok(())
}
