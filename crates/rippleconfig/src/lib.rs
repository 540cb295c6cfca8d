use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// Schema version understood by this build.
pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowLayer {
    /// Keep the window below every other toplevel.
    #[default]
    Background,
    /// Ordinary stacking; useful when previewing the effect.
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpaceSetting {
    #[default]
    Auto,
    Gamma,
    Linear,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RippleConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub window: WindowSection,
    #[serde(default)]
    pub render: RenderSection,
}

impl Default for RippleConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            window: WindowSection::default(),
            render: RenderSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowSection {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(
        default,
        deserialize_with = "deserialize_size_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub size: Option<(u32, u32)>,
    #[serde(default)]
    pub fullscreen: bool,
    #[serde(default)]
    pub decorations: bool,
    #[serde(default)]
    pub layer: WindowLayer,
    #[serde(default)]
    pub click_through: bool,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            title: default_title(),
            size: None,
            fullscreen: false,
            decorations: false,
            layer: WindowLayer::default(),
            click_through: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RenderSection {
    /// Output opacity; unset leaves the renderer default in place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f32>,
    #[serde(
        default,
        deserialize_with = "deserialize_duration_opt",
        serialize_with = "serialize_duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub frame_interval: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub still_time: Option<f32>,
    #[serde(default)]
    pub color_space: ColorSpaceSetting,
    #[serde(default = "default_vsync")]
    pub vsync: bool,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            opacity: None,
            fps: None,
            frame_interval: None,
            still_time: None,
            color_space: ColorSpaceSetting::default(),
            vsync: default_vsync(),
        }
    }
}

impl RenderSection {
    /// Frame cap in frames per second; `None` means one frame per redraw.
    ///
    /// An explicit `fps` wins over `frame_interval`. Zero in either field means
    /// uncapped.
    pub fn target_fps(&self) -> Option<f32> {
        if let Some(fps) = self.fps {
            return normalize_fps(fps);
        }
        self.frame_interval.and_then(|interval| {
            if interval.is_zero() {
                None
            } else {
                normalize_fps(1.0 / interval.as_secs_f32())
            }
        })
    }
}

fn normalize_fps(value: f32) -> Option<f32> {
    if value > 0.0 && value.is_finite() {
        Some(value)
    } else {
        None
    }
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_title() -> String {
    "ripplewall".to_string()
}

fn default_vsync() -> bool {
    true
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom(format!(
                    "duration must be a finite non-negative number of seconds, got {v}"
                )));
            }
            Duration::try_from_secs_f64(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration {v}: {err}")))
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn serialize_duration_opt<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(duration) => {
            serializer.serialize_str(&humantime::format_duration(*duration).to_string())
        }
        None => serializer.serialize_none(),
    }
}

fn deserialize_size_opt<'de, D>(deserializer: D) -> Result<Option<(u32, u32)>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Helper {
        Str(String),
        Pair([u32; 2]),
    }

    let helper: Option<Helper> = Option::deserialize(deserializer)?;
    match helper {
        None => Ok(None),
        Some(Helper::Str(raw)) => parse_size(&raw).map(Some).map_err(de::Error::custom),
        Some(Helper::Pair([width, height])) => {
            if width == 0 || height == 0 {
                return Err(de::Error::custom("window dimensions must be greater than zero"));
            }
            Ok(Some((width, height)))
        }
    }
}

/// Parses a `WIDTHxHEIGHT` size specification such as `1920x1080`.
pub fn parse_size(spec: &str) -> Result<(u32, u32), String> {
    let trimmed = spec.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| "expected WxH format, e.g. 1920x1080".to_string())?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width in size specification '{trimmed}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height in size specification '{trimmed}'"))?;

    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".to_string());
    }

    Ok((width, height))
}

impl RippleConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: RippleConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {} (expected {CONFIG_VERSION})",
                self.version
            )));
        }

        if let Some(opacity) = self.render.opacity {
            if !(0.0..=1.0).contains(&opacity) {
                return Err(ConfigError::Invalid(format!(
                    "render.opacity must be within 0.0..=1.0, got {opacity}"
                )));
            }
        }

        if let Some(fps) = self.render.fps {
            if fps.is_nan() || fps < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "render.fps must be non-negative, got {fps}"
                )));
            }
        }

        if self.render.fps.is_some() && self.render.frame_interval.is_some() {
            return Err(ConfigError::Invalid(
                "render.fps and render.frame_interval are mutually exclusive".to_string(),
            ));
        }

        if let Some(time) = self.render.still_time {
            if !time.is_finite() || time < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "render.still_time must be a non-negative number of seconds, got {time}"
                )));
            }
        }

        if self.window.title.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "window.title must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|err| ConfigError::Invalid(err.to_string()))
    }
}
