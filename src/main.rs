#![cfg_attr(not(test), deny(dead_code))]

mod cli;
mod error;
mod graphics;
mod math;
mod scene;
mod state;
mod vertex;
mod widget;

use crate::error::AppError;
use crate::graphics::Canvas;
use crate::state::RotationParameters;
use crate::widget::PlaneWidget;
use crossterm::cursor::{Hide, Show};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, style::ResetColor};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const MIN_COLUMNS: u16 = 20;
const MIN_ROWS: u16 = 10;

/// Puts the terminal into raw, alternate-screen mode and restores it on drop
struct TerminalGuard;

impl TerminalGuard {
    fn enter<W: Write>(out: &mut W) -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(out, EnterAlternateScreen, Hide)?;
        Ok(TerminalGuard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let mut out = io::stdout();
        let _ = execute!(out, ResetColor, Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

fn init_logging(args: &cli::Args) -> Result<(), AppError> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };
    let file = File::create(path).map_err(|source| AppError::Log {
        path: path.clone(),
        source,
    })?;
    let filter =
        EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("planeview=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Terminal size in columns and rows
fn terminal_size() -> (u16, u16) {
    termsize::get()
        .map(|size| (size.cols, size.rows))
        .or_else(|| terminal::size().ok())
        .unwrap_or((80, 24))
}

/// Starting parameters; anything unparseable keeps its default
fn initial_parameters(args: &cli::Args) -> RotationParameters {
    let mut params = RotationParameters::default();
    params.set_axis_angle(&args.axis_angle);
    params.set_rotation_angle(&args.rotation_angle);
    params.set_zoom(&args.zoom);
    params
}

/// Main function
fn main() -> Result<(), AppError> {
    let args = cli::parse();
    init_logging(&args)?;

    let (columns, rows) = terminal_size();
    if columns < MIN_COLUMNS || rows < MIN_ROWS {
        return Err(AppError::TerminalTooSmall {
            cols: columns,
            rows,
            min_cols: MIN_COLUMNS,
            min_rows: MIN_ROWS,
        });
    }

    let params = initial_parameters(&args);
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    if args.frame_ms == 0 {
        warn!("frame interval of 0 ms will busy-poll the terminal");
    }
    info!(columns, rows, ?params, "starting");

    let canvas = Canvas::new(columns as usize, rows as usize);
    let mut widget = PlaneWidget::new(canvas, params, rng);

    let mut out = io::stdout();
    let _guard = TerminalGuard::enter(&mut out)?;
    widget::run(&mut out, &mut widget, Duration::from_millis(args.frame_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn bad_initial_values_fall_back_to_defaults() {
        let args = cli::Args::parse_from([
            "planeview",
            "--axis-angle",
            "north",
            "--rotation-angle",
            "30",
            "--zoom",
            "-1",
        ]);
        let params = initial_parameters(&args);
        assert_eq!(params.axis_angle_degrees, 45.0);
        assert_eq!(params.rotation_angle_degrees, 30.0);
        assert_eq!(params.zoom_factor, 1.0);
    }
}
