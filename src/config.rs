//! Configuration loading with env-var overrides.
//!
//! Reads `holo-avatar.toml` from the working directory (or the file named
//! by `HOLO_AVATAR_CONFIG`), then applies `HOLO_AVATAR_CHAT_URL` and
//! `HOLO_AVATAR_RENDERER` overrides. Every field has a default, so a missing
//! default file is not an error.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::{AvatarError, Result};
use crate::render::RenderBackend;
use crate::scene::DEFAULT_PARTICLE_COUNT;
use crate::voice::{Language, DEFAULT_RATE, DEFAULT_WORDS_PER_SECOND};

pub const DEFAULT_CONFIG_FILE: &str = "holo-avatar.toml";

/// Render surface and backend selection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub renderer: RenderBackend,
    /// Use the CPU raymarcher when the GPU cannot be initialised.
    pub allow_cpu_fallback: bool,
    /// Multiplier on the physical surface size.
    pub render_scale: f32,
    /// Upper bound on surface pixels; larger surfaces are scaled down.
    pub max_render_pixels: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            renderer: RenderBackend::Gpu,
            allow_cpu_fallback: true,
            render_scale: 1.0,
            max_render_pixels: 640 * 480,
        }
    }
}

/// Chat backend client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    /// Sent with every message when set; the server defaults it otherwise.
    pub session_id: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_seconds: 30,
            session_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub language: Language,
    pub rate: f32,
    pub words_per_second: f32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            language: Language::English,
            rate: DEFAULT_RATE,
            words_per_second: DEFAULT_WORDS_PER_SECOND,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub count: usize,
    /// Fixed seed for a reproducible field; random when unset.
    pub seed: Option<u64>,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            count: DEFAULT_PARTICLE_COUNT,
            seed: None,
        }
    }
}

/// Fully-resolved application configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    pub viewport: ViewportConfig,
    pub chat: ChatConfig,
    pub voice: VoiceConfig,
    pub particles: ParticleConfig,
}

/// Environment overrides, collected separately so tests never touch the
/// process environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub chat_url: Option<String>,
    pub renderer: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self {
            chat_url: env::var("HOLO_AVATAR_CHAT_URL").ok(),
            renderer: env::var("HOLO_AVATAR_RENDERER").ok(),
        }
    }
}

/// Load the config file, then apply env-var overrides.
pub fn load() -> Result<AvatarConfig> {
    let explicit = env::var("HOLO_AVATAR_CONFIG").ok().map(PathBuf::from);
    let overrides = Overrides::from_env();
    match explicit {
        Some(path) => load_from(Some(&path), &overrides),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            load_from(default.exists().then_some(default), &overrides)
        }
    }
}

/// Internal loader: `None` means built-in defaults.
pub fn load_from(path: Option<&Path>, overrides: &Overrides) -> Result<AvatarConfig> {
    let mut config = match path {
        Some(path) => {
            let raw = fs::read_to_string(path).map_err(|e| {
                io::Error::new(e.kind(), format!("cannot read {}: {e}", path.display()))
            })?;
            parse(&raw).map_err(|e| match e {
                AvatarError::Config(msg) => {
                    AvatarError::Config(format!("{}: {msg}", path.display()))
                }
                other => other,
            })?
        }
        None => AvatarConfig::default(),
    };
    apply_overrides(&mut config, overrides)?;
    validate(&config)?;
    Ok(config)
}

pub fn parse(raw: &str) -> Result<AvatarConfig> {
    toml::from_str(raw).map_err(|e| AvatarError::Config(format!("parse error: {e}")))
}

fn apply_overrides(config: &mut AvatarConfig, overrides: &Overrides) -> Result<()> {
    if let Some(url) = &overrides.chat_url {
        config.chat.base_url = url.clone();
    }
    if let Some(renderer) = &overrides.renderer {
        config.viewport.renderer = renderer
            .parse()
            .map_err(|e: String| AvatarError::Config(format!("HOLO_AVATAR_RENDERER: {e}")))?;
    }
    Ok(())
}

fn validate(config: &AvatarConfig) -> Result<()> {
    let v = &config.viewport;
    if !(v.render_scale > 0.0 && v.render_scale <= 4.0) {
        return Err(AvatarError::Config(format!(
            "viewport.render_scale must be in (0, 4], got {}",
            v.render_scale
        )));
    }
    if v.max_render_pixels == 0 {
        return Err(AvatarError::Config("viewport.max_render_pixels must be positive".into()));
    }
    if config.voice.rate <= 0.0 {
        return Err(AvatarError::Config("voice.rate must be positive".into()));
    }
    Ok(())
}
