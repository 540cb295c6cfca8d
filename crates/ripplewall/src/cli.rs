use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rippleconfig::{parse_size, ColorSpaceSetting, WindowLayer};

#[derive(Parser, Debug)]
#[command(
    name = "ripplewall",
    author,
    version,
    about = "Animated ripple desktop background",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Configuration file (defaults to `config.toml` in the config directory).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Frame rate cap (0=uncapped).
    #[arg(long, value_name = "FPS", value_parser = parse_fps)]
    pub fps: Option<f32>,

    /// Freeze the ripple clock at this many seconds.
    #[arg(long, value_name = "SECONDS", value_parser = parse_still_time)]
    pub still_time: Option<f32>,

    /// Output opacity between 0.0 and 1.0.
    #[arg(long, value_name = "OPACITY", value_parser = parse_opacity)]
    pub opacity: Option<f32>,

    /// Stacking order: `background` or `normal`.
    #[arg(long, value_name = "LAYER", value_parser = parse_layer)]
    pub layer: Option<WindowLayer>,

    /// Let clicks fall through the window.
    #[arg(long)]
    pub click_through: bool,

    /// Cover the current monitor.
    #[arg(long)]
    pub fullscreen: bool,

    /// Output color space handling: `auto`, `gamma`, or `linear`.
    #[arg(long, value_name = "MODE", value_parser = parse_color_space)]
    pub color_space: Option<ColorSpaceSetting>,

    /// Present in sync with the display: `on` or `off`.
    #[arg(long, value_name = "on|off", value_parser = parse_toggle)]
    pub vsync: Option<bool>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect and validate the configuration file.
    Config(ConfigCommand),
}

#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the resolved configuration directory and file.
    Where,
    /// Validate a configuration file and print the effective settings.
    Check {
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_fps(value: &str) -> Result<f32, String> {
    let fps: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid frame rate '{value}'"))?;
    if !fps.is_finite() || fps < 0.0 {
        return Err("frame rate must be a non-negative number".to_string());
    }
    Ok(fps)
}

pub fn parse_still_time(value: &str) -> Result<f32, String> {
    let seconds: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid still time '{value}'"))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err("still time must be a non-negative number of seconds".to_string());
    }
    Ok(seconds)
}

pub fn parse_opacity(value: &str) -> Result<f32, String> {
    let opacity: f32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid opacity '{value}'"))?;
    if !(0.0..=1.0).contains(&opacity) {
        return Err(format!("opacity must be within 0.0..=1.0, got {opacity}"));
    }
    Ok(opacity)
}

pub fn parse_layer(value: &str) -> Result<WindowLayer, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "background" | "bottom" => Ok(WindowLayer::Background),
        "normal" => Ok(WindowLayer::Normal),
        "" => Err("layer must not be empty".to_string()),
        _ => Err("unknown layer (expected background or normal)".to_string()),
    }
}

pub fn parse_color_space(value: &str) -> Result<ColorSpaceSetting, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("color space must not be empty".to_string());
    }

    match trimmed.to_ascii_lowercase().as_str() {
        "auto" | "default" => Ok(ColorSpaceSetting::Auto),
        "gamma" | "srgb" => Ok(ColorSpaceSetting::Gamma),
        "linear" => Ok(ColorSpaceSetting::Linear),
        _ => Err("unknown color space (expected auto, gamma, or linear)".to_string()),
    }
}

pub fn parse_toggle(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(format!("expected on or off, got '{value}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fps_rejects_negative_values() {
        assert_eq!(parse_fps("30").unwrap(), 30.0);
        assert_eq!(parse_fps("0").unwrap(), 0.0);
        assert!(parse_fps("-1").is_err());
        assert!(parse_fps("fast").is_err());
    }

    #[test]
    fn parse_opacity_enforces_range() {
        assert_eq!(parse_opacity("0.3").unwrap(), 0.3);
        assert_eq!(parse_opacity("1").unwrap(), 1.0);
        assert!(parse_opacity("1.5").is_err());
        assert!(parse_opacity("-0.1").is_err());
    }

    #[test]
    fn parse_layer_accepts_aliases() {
        assert_eq!(parse_layer("Background").unwrap(), WindowLayer::Background);
        assert_eq!(parse_layer("bottom").unwrap(), WindowLayer::Background);
        assert_eq!(parse_layer("normal").unwrap(), WindowLayer::Normal);
        assert!(parse_layer("top").is_err());
    }

    #[test]
    fn parse_color_space_variants() {
        assert_eq!(parse_color_space("auto").unwrap(), ColorSpaceSetting::Auto);
        assert_eq!(parse_color_space("sRGB").unwrap(), ColorSpaceSetting::Gamma);
        assert_eq!(parse_color_space("linear").unwrap(), ColorSpaceSetting::Linear);
        assert!(parse_color_space("").is_err());
    }

    #[test]
    fn parse_toggle_variants() {
        assert!(parse_toggle("on").unwrap());
        assert!(!parse_toggle("OFF").unwrap());
        assert!(parse_toggle("maybe").is_err());
    }

    #[test]
    fn cli_parses_overrides_and_subcommands() {
        let cli = Cli::try_parse_from([
            "ripplewall",
            "--size",
            "800x600",
            "--fps",
            "30",
            "--opacity",
            "0.5",
            "--vsync",
            "off",
        ])
        .unwrap();
        assert_eq!(cli.run.size, Some((800, 600)));
        assert_eq!(cli.run.fps, Some(30.0));
        assert_eq!(cli.run.opacity, Some(0.5));
        assert_eq!(cli.run.vsync, Some(false));
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["ripplewall", "config", "check", "custom.toml"]).unwrap();
        match cli.command {
            Some(Command::Config(ConfigCommand {
                action: ConfigAction::Check { file },
            })) => assert_eq!(file, Some(PathBuf::from("custom.toml"))),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
