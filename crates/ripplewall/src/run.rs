use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use renderer::{ColorSpaceMode, RenderPolicy, Renderer, RendererConfig};
use rippleconfig::{ColorSpaceSetting, RippleConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::paths::AppPaths;

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let (config_path, required) = match args.config.as_ref() {
        Some(path) => (path.clone(), true),
        None => (paths.config_file(), false),
    };
    tracing::debug!(
        config_dir = %paths.config_dir().display(),
        config_file = %config_path.display(),
        "resolved ripplewall paths"
    );

    let file_config = load_config(&config_path, required)?;
    let renderer_config = build_renderer_config(&file_config, &args);
    tracing::info!(
        size = ?renderer_config.surface_size,
        fullscreen = renderer_config.fullscreen,
        layer = ?renderer_config.layer,
        opacity = renderer_config.opacity,
        policy = ?renderer_config.policy,
        "starting ripple background"
    );

    let mut renderer = Renderer::new(renderer_config);
    renderer.run()
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Reads and validates the configuration at `path`.
///
/// A missing file yields the defaults unless `required` is set.
pub fn load_config(path: &Path, required: bool) -> Result<RippleConfig> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound && !required => {
            tracing::debug!(path = %path.display(), "no configuration file; using defaults");
            return Ok(RippleConfig::default());
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config at {}", path.display()))
        }
    };

    RippleConfig::from_toml_str(&contents)
        .with_context(|| format!("invalid config at {}", path.display()))
}

/// Merges command-line overrides over the file configuration.
pub fn build_renderer_config(config: &RippleConfig, args: &RunArgs) -> RendererConfig {
    let defaults = RendererConfig::default();
    let window = &config.window;
    let render = &config.render;

    let still_time = args.still_time.or(render.still_time);
    let policy = match still_time {
        Some(time) => RenderPolicy::Still { time },
        None => {
            let target_fps = match args.fps {
                Some(fps) if fps > 0.0 => Some(fps),
                Some(_) => None,
                None => render.target_fps(),
            };
            RenderPolicy::Animate { target_fps }
        }
    };

    RendererConfig {
        title: window.title.clone(),
        surface_size: args.size.or(window.size).unwrap_or(defaults.surface_size),
        fullscreen: args.fullscreen || window.fullscreen,
        decorations: window.decorations,
        layer: map_layer(args.layer.unwrap_or(window.layer)),
        click_through: args.click_through || window.click_through,
        opacity: args.opacity.or(render.opacity).unwrap_or(defaults.opacity),
        color_space: map_color_space(args.color_space.unwrap_or(render.color_space)),
        vsync: args.vsync.unwrap_or(render.vsync),
        policy,
    }
}

fn map_layer(layer: rippleconfig::WindowLayer) -> renderer::WindowLayer {
    match layer {
        rippleconfig::WindowLayer::Background => renderer::WindowLayer::Background,
        rippleconfig::WindowLayer::Normal => renderer::WindowLayer::Normal,
    }
}

fn map_color_space(setting: ColorSpaceSetting) -> ColorSpaceMode {
    match setting {
        ColorSpaceSetting::Auto => ColorSpaceMode::Auto,
        ColorSpaceSetting::Gamma => ColorSpaceMode::Gamma,
        ColorSpaceSetting::Linear => ColorSpaceMode::Linear,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FILE: &str = r#"
version = 1

[window]
size = "1280x720"
layer = "normal"

[render]
opacity = 0.5
fps = 24
color_space = "linear"
"#;

    fn file_config() -> RippleConfig {
        RippleConfig::from_toml_str(FILE).unwrap()
    }

    #[test]
    fn file_values_apply_without_overrides() {
        let config = build_renderer_config(&file_config(), &RunArgs::default());
        assert_eq!(config.surface_size, (1280, 720));
        assert_eq!(config.layer, renderer::WindowLayer::Normal);
        assert_eq!(config.opacity, 0.5);
        assert_eq!(config.color_space, ColorSpaceMode::Linear);
        assert_eq!(
            config.policy,
            RenderPolicy::Animate {
                target_fps: Some(24.0)
            }
        );
        assert!(config.vsync);
    }

    #[test]
    fn cli_overrides_file_values() {
        let args = RunArgs {
            size: Some((640, 480)),
            opacity: Some(0.8),
            fps: Some(0.0),
            layer: Some(rippleconfig::WindowLayer::Background),
            vsync: Some(false),
            click_through: true,
            ..RunArgs::default()
        };
        let config = build_renderer_config(&file_config(), &args);
        assert_eq!(config.surface_size, (640, 480));
        assert_eq!(config.opacity, 0.8);
        assert_eq!(config.layer, renderer::WindowLayer::Background);
        assert_eq!(config.policy, RenderPolicy::Animate { target_fps: None });
        assert!(!config.vsync);
        assert!(config.click_through);
    }

    #[test]
    fn defaults_match_the_page_background() {
        let config = build_renderer_config(&RippleConfig::default(), &RunArgs::default());
        assert_eq!(config.opacity, renderer::DEFAULT_OPACITY);
        assert_eq!(config.layer, renderer::WindowLayer::Background);
        assert_eq!(config.color_space, ColorSpaceMode::Auto);
        assert_eq!(config.surface_size, RendererConfig::default().surface_size);
        assert_eq!(config.policy, RenderPolicy::default());
    }

    #[test]
    fn file_without_opacity_keeps_renderer_default() {
        let file = RippleConfig::from_toml_str("[render]\nfps = 30\n").unwrap();
        let config = build_renderer_config(&file, &RunArgs::default());
        assert_eq!(config.opacity, renderer::DEFAULT_OPACITY);
        assert_eq!(config.opacity, RendererConfig::default().opacity);
    }

    #[test]
    fn still_time_selects_still_policy() {
        let args = RunArgs {
            still_time: Some(4.0),
            fps: Some(60.0),
            ..RunArgs::default()
        };
        let config = build_renderer_config(&file_config(), &args);
        assert_eq!(config.policy, RenderPolicy::Still { time: 4.0 });
    }

    #[test]
    fn missing_default_config_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("config.toml"), false).unwrap();
        assert_eq!(config.render.opacity, None);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = load_config(&dir.path().join("absent.toml"), true).unwrap_err();
        assert!(format!("{err:#}").contains("absent.toml"));
    }

    #[test]
    fn invalid_config_reports_path_and_reason() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[render]\nopacity = 2.0\n").unwrap();
        let err = load_config(&path, false).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("config.toml"));
        assert!(message.contains("opacity"));
    }
}
