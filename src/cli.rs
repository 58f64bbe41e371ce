use clap::Parser;
use std::path::PathBuf;

/// Rotate a plane about an in-plane axis and watch its grid, points and labels follow.
#[derive(Parser, Debug)]
#[command(name = "planeview", version, about)]
pub struct Args {
    /// Direction of the rotation axis, degrees from +X.
    #[arg(long, default_value = "45", allow_hyphen_values = true)]
    pub axis_angle: String,

    /// Rotation about the axis, degrees.
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub rotation_angle: String,

    /// Zoom factor (0.1 to 10).
    #[arg(long, default_value = "1.0", allow_hyphen_values = true)]
    pub zoom: String,

    /// Milliseconds between frames.
    #[arg(long, default_value_t = 16)]
    pub frame_ms: u64,

    /// Seed for random point placement.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write logs to this file. Nothing is logged without it.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log filter directive (e.g. debug, planeview=trace).
    #[arg(long, default_value = "planeview=info")]
    pub log_level: String,
}

pub fn parse() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["planeview"]);
        assert_eq!(args.axis_angle, "45");
        assert_eq!(args.rotation_angle, "0");
        assert_eq!(args.zoom, "1.0");
        assert_eq!(args.frame_ms, 16);
        assert!(args.seed.is_none());
        assert!(args.log_file.is_none());
    }

    #[test]
    fn negative_angles_are_accepted() {
        let args = Args::parse_from(["planeview", "--axis-angle", "-30", "--seed", "9"]);
        assert_eq!(args.axis_angle, "-30");
        assert_eq!(args.seed, Some(9));
    }
}
