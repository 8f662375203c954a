use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rollcall_core::{
    cosine_for_distance, load_gallery, recognize, EuclideanMatcher, FaceEncoder, Gallery,
    GalleryError, OnnxFaceEncoder, Recognition, ARCFACE_ACCEPT_THRESHOLD,
};
use rollcall_hw::{capture_one, Camera, CaptureSource, ImageFileSource, V4lSource};
use rollcall_ledger::{AttendanceLedger, Clock, SystemClock};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod config;
mod exit;

use config::Config;

#[derive(Parser)]
#[command(name = "rollcall", about = "Face-recognition attendance check-in")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Overrides for values otherwise taken from `ROLLCALL_*` variables.
#[derive(Args)]
struct Overrides {
    /// Directory of reference images, one face per file, named after the person
    #[arg(long)]
    gallery: Option<PathBuf>,
    /// Directory holding the daily ledger files
    #[arg(long)]
    ledger_dir: Option<PathBuf>,
    /// Directory containing det_10g.onnx and w600k_r50.onnx
    #[arg(long)]
    model_dir: Option<PathBuf>,
}

impl Overrides {
    fn apply(self, config: &mut Config) {
        if let Some(dir) = self.gallery {
            config.gallery_dir = dir;
        }
        if let Some(dir) = self.ledger_dir {
            config.ledger_dir = dir;
        }
        if let Some(dir) = self.model_dir {
            config.model_dir = dir;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Capture one frame, recognise the face and record attendance
    CheckIn {
        /// Use a still image instead of the camera
        #[arg(long)]
        image: Option<PathBuf>,
        /// V4L2 camera device
        #[arg(long)]
        device: Option<String>,
        /// Acceptance threshold on descriptor distance
        #[arg(long)]
        threshold: Option<f32>,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Load the reference gallery and list its entries
    Gallery {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Print the attendance recorded for a day
    Report {
        /// Day to show, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// List V4L2 capture devices
    Devices,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match run(cli.command, config) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit::code_for(&err))
        }
    }
}

fn run(command: Commands, mut config: Config) -> Result<u8> {
    tracing::debug!(?config, "configuration from environment");
    match command {
        Commands::CheckIn {
            image,
            device,
            threshold,
            overrides,
        } => {
            overrides.apply(&mut config);
            if let Some(device) = device {
                config.camera_device = device;
            }
            if let Some(threshold) = threshold {
                config.accept_threshold = threshold;
            }
            check_in(&config, image, &SystemClock)
        }
        Commands::Gallery { json, overrides } => {
            overrides.apply(&mut config);
            list_gallery(&config, json)
        }
        Commands::Report {
            date,
            json,
            overrides,
        } => {
            overrides.apply(&mut config);
            let date = date.unwrap_or_else(|| SystemClock.now().date());
            report(&config, date, json)
        }
        Commands::Devices => {
            let devices = Camera::list_devices();
            if devices.is_empty() {
                println!("No V4L2 capture devices found");
            }
            for d in devices {
                println!("{}  {} ({}, {})", d.path, d.name, d.driver, d.bus);
            }
            Ok(exit::SUCCESS)
        }
    }
}

/// Load the face models and build the gallery with them.
fn load_references(config: &Config) -> Result<(OnnxFaceEncoder, Gallery)> {
    // Fail on a missing gallery before paying for model loading.
    if !config.gallery_dir.is_dir() {
        return Err(GalleryError::DirectoryNotFound(config.gallery_dir.clone()).into());
    }

    let mut encoder = OnnxFaceEncoder::load(&config.model_dir)
        .with_context(|| format!("loading face models from {}", config.model_dir.display()))?;
    let gallery = load_gallery(&config.gallery_dir, &mut encoder)?;

    Ok((encoder, gallery))
}

/// Load references, capture one frame, recognise it and record the result.
fn check_in<C: Clock>(config: &Config, image: Option<PathBuf>, clock: &C) -> Result<u8> {
    let (mut encoder, gallery) = load_references(config)?;
    println!("Loaded {} known faces", gallery.len());
    warn_if_uncalibrated(config.accept_threshold);

    let ledger = AttendanceLedger::new(&config.ledger_dir);
    match image {
        Some(path) => check_in_with(
            &mut encoder,
            &gallery,
            &ImageFileSource::new(path),
            &ledger,
            clock,
            config.accept_threshold,
        ),
        None => check_in_with(
            &mut encoder,
            &gallery,
            &V4lSource {
                device_path: config.camera_device.clone(),
                warmup_frames: config.warmup_frames,
            },
            &ledger,
            clock,
            config.accept_threshold,
        ),
    }
}

/// Capture one frame from `source`, recognise it against `gallery`, and
/// append to `ledger` only when a face is recognised.
fn check_in_with<E, S, C>(
    encoder: &mut E,
    gallery: &Gallery,
    source: &S,
    ledger: &AttendanceLedger,
    clock: &C,
    threshold: f32,
) -> Result<u8>
where
    E: FaceEncoder + ?Sized,
    S: CaptureSource + ?Sized,
    C: Clock + ?Sized,
{
    let frame = capture_one(source).context("failed to capture frame")?;
    println!("Captured frame {}x{}", frame.width(), frame.height());

    let outcome = recognize(encoder, &EuclideanMatcher, gallery, &frame.image, threshold);

    let label = match outcome {
        Recognition::Recognized { label, distance } => {
            println!("Recognized: {label} (distance: {distance:.4})");
            label
        }
        Recognition::NoFaceDetected => {
            println!("No faces detected in the frame.");
            return Ok(exit::NOTHING_RECOGNIZED);
        }
        Recognition::EncodingFailed(reason) => {
            println!("Face encoding failed: {reason}");
            return Ok(exit::NOTHING_RECOGNIZED);
        }
        Recognition::NoMatch => {
            println!("No face recognized.");
            return Ok(exit::NOTHING_RECOGNIZED);
        }
    };

    let record = ledger.record_now(&label, clock)?;
    println!("Marked attendance for {} at {}", record.name, record.time);

    Ok(exit::SUCCESS)
}

/// Warn when `threshold` rejects most genuine ArcFace matches. Returns whether it warned.
fn warn_if_uncalibrated(threshold: f32) -> bool {
    if threshold >= ARCFACE_ACCEPT_THRESHOLD {
        return false;
    }
    tracing::warn!(
        threshold,
        cosine = cosine_for_distance(threshold),
        recommended = ARCFACE_ACCEPT_THRESHOLD,
        "acceptance threshold is stricter than the ArcFace calibration; set ROLLCALL_ACCEPT_THRESHOLD to relax it"
    );
    true
}

#[derive(Serialize)]
struct GalleryListing<'a> {
    label: &'a str,
    dimension: usize,
    model_version: Option<&'a str>,
}

fn list_gallery(config: &Config, json: bool) -> Result<u8> {
    let (_, gallery) = load_references(config)?;

    let listing: Vec<GalleryListing<'_>> = gallery
        .iter()
        .map(|e| GalleryListing {
            label: &e.label,
            dimension: e.descriptor.len(),
            model_version: e.descriptor.model_version.as_deref(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
    } else {
        for item in &listing {
            println!("{}\t{}-d", item.label, item.dimension);
        }
        println!("{} reference faces", listing.len());
    }
    Ok(exit::SUCCESS)
}

fn report(config: &Config, date: NaiveDate, json: bool) -> Result<u8> {
    let ledger = AttendanceLedger::new(&config.ledger_dir);
    let records = ledger.read_day(date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        println!("No attendance recorded on {date} in {}", ledger.dir().display());
    } else {
        for r in &records {
            println!("{}\t{}", r.time, r.name);
        }
    }
    Ok(exit::SUCCESS)
}
