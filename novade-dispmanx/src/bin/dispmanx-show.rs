// dispmanx-show: puts a blank frame, grid, calibration pattern or raw RGBA
// image on a dispmanx display.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use novade_dispmanx::ffi::BcmHostCompositor;
use novade_dispmanx::{logging, ArgbBitmap, ConfigLoader, DispmanxConfig, DispmanxDevice};

#[derive(Parser, Debug)]
#[command(name = "dispmanx-show", about = "Show a frame on a dispmanx display")]
struct Cli {
    /// TOML configuration file. Defaults apply when it does not exist.
    #[arg(short, long, default_value = "/etc/novade/dispmanx.toml")]
    config: PathBuf,

    /// Seconds to keep the frame on screen before disposing the display.
    #[arg(long, default_value_t = 5)]
    hold: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Remove whatever is on screen.
    Blank,
    /// Square grid with the given line spacing in pixels.
    Grid { spacing: u32 },
    /// Calibration grid with separate horizontal and vertical spacing.
    Calibration { x_spacing: u32, y_spacing: u32 },
    /// Raw RGBA8 file, row-major without padding.
    Image {
        path: PathBuf,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match ConfigLoader::load_from_path(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            logging::init_minimal_logging();
            return Err(e)
                .with_context(|| format!("Failed to load configuration from {:?}", cli.config));
        }
    };
    if let Err(e) = logging::init_logging_or_minimal(&config.logging) {
        warn!("Using minimal logging: {}", e);
    }

    let result = run(&config, cli.command, cli.hold);
    logging::flush_file_logging();
    result
}

fn run(config: &DispmanxConfig, command: Command, hold: u64) -> Result<()> {
    let device = DispmanxDevice::from_config(&config.display, Arc::new(BcmHostCompositor::new()));
    let (width, height) = device.bounds().context("Failed to open display")?;
    info!(device = device.name(), width, height, "display ready");

    let shown = match command {
        Command::Blank => device.show_blank(),
        Command::Grid { spacing } => device.show_grid(spacing),
        Command::Calibration { x_spacing, y_spacing } => {
            device.show_calibration_pattern(x_spacing, y_spacing)
        }
        Command::Image { path, width, height } => match load_rgba(&path, width, height) {
            Ok(bitmap) => device.show_image(&bitmap),
            Err(e) => {
                device.dispose();
                return Err(e);
            }
        },
    };
    if let Err(e) = shown {
        device.dispose();
        return Err(e).context("Failed to show frame");
    }

    std::thread::sleep(Duration::from_secs(hold));
    device.dispose();
    info!("display disposed");
    Ok(())
}

fn load_rgba(path: &Path, width: u32, height: u32) -> Result<ArgbBitmap> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let Some(bitmap) = ArgbBitmap::from_rgba8(width, height, &bytes) else {
        bail!(
            "{:?} holds {} bytes, expected {} for {}x{} RGBA",
            path,
            bytes.len(),
            width as usize * height as usize * 4,
            width,
            height
        );
    };
    Ok(bitmap)
}
