use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::charset::{GlyphRamp, RAMP_CLASSIC};
use crate::error::CoreError;

/// Configuration complète de l'outil, sérialisable en TOML.
///
/// Chaque champ a une valeur par défaut saine ; un fichier peut n'en
/// surcharger qu'une partie.
///
/// # Example
/// ```
/// use reel_core::config::AppConfig;
/// let config = AppConfig::default();
/// assert_eq!(config.render.ramp, "@%#*+=-:. ");
/// assert_eq!(config.tools.ffmpeg, "ffmpeg");
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    /// Conversion luminance → caractères.
    pub render: RenderSettings,
    /// Exécutables externes.
    pub tools: ToolSettings,
    /// Lecture de la piste audio.
    pub audio: AudioSettings,
    /// Comportement du terminal pendant la lecture.
    pub playback: PlaybackSettings,
}

/// `[render]` section.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct RenderSettings {
    /// Rampe de glyphes, du plus sombre au plus clair.
    pub ramp: String,
    /// Inverser la rampe (pour fond clair).
    pub invert: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            ramp: RAMP_CLASSIC.to_string(),
            invert: false,
        }
    }
}

/// `[tools]` section.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ToolSettings {
    /// Chemin ou nom de l'exécutable ffmpeg.
    pub ffmpeg: String,
    /// Chemin ou nom de l'exécutable ffprobe.
    pub ffprobe: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".to_string(),
            ffprobe: "ffprobe".to_string(),
        }
    }
}

/// `[audio]` section.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct AudioSettings {
    /// Jouer la piste audio extraite.
    pub enabled: bool,
    /// Commande du lecteur (programme puis arguments, le fichier est ajouté à la fin).
    /// `None` = lecteur de la plateforme.
    pub player: Option<Vec<String>>,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            player: None,
        }
    }
}

/// `[playback]` section.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PlaybackSettings {
    /// Masquer le curseur pendant la lecture.
    pub hide_cursor: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self { hide_cursor: true }
    }
}

impl AppConfig {
    /// Check values that cannot be clamped.
    ///
    /// # Errors
    /// [`CoreError::EmptyRamp`] for an empty ramp, [`CoreError::Config`] for an
    /// empty tool name or an empty audio player command.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.render.ramp.is_empty() {
            return Err(CoreError::EmptyRamp);
        }
        if self.tools.ffmpeg.trim().is_empty() || self.tools.ffprobe.trim().is_empty() {
            return Err(CoreError::Config(
                "tools.ffmpeg et tools.ffprobe ne peuvent pas être vides".into(),
            ));
        }
        if self
            .audio
            .player
            .as_ref()
            .is_some_and(|cmd| cmd.first().is_none_or(|p| p.trim().is_empty()))
        {
            return Err(CoreError::Config(
                "audio.player doit commencer par un programme".into(),
            ));
        }
        Ok(())
    }

    /// Rampe effective (inversée si `render.invert`).
    ///
    /// # Errors
    /// [`CoreError::EmptyRamp`] if the configured ramp is empty.
    ///
    /// # Example
    /// ```
    /// use reel_core::config::AppConfig;
    /// let mut config = AppConfig::default();
    /// config.render.invert = true;
    /// assert_eq!(config.glyph_ramp().unwrap().map(0), ' ');
    /// ```
    pub fn glyph_ramp(&self) -> Result<GlyphRamp, CoreError> {
        let ramp = GlyphRamp::new(&self.render.ramp)?;
        Ok(if self.render.invert {
            ramp.inverted()
        } else {
            ramp
        })
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    render: Option<RenderSection>,
    tools: Option<ToolSection>,
    audio: Option<AudioSection>,
    playback: Option<PlaybackSection>,
}

#[derive(Deserialize)]
struct RenderSection {
    ramp: Option<String>,
    invert: Option<bool>,
}

#[derive(Deserialize)]
struct ToolSection {
    ffmpeg: Option<String>,
    ffprobe: Option<String>,
}

#[derive(Deserialize)]
struct AudioSection {
    enabled: Option<bool>,
    player: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct PlaybackSection {
    hide_cursor: Option<bool>,
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or if the merged
/// configuration fails [`AppConfig::validate`].
///
/// # Example
/// ```no_run
/// use reel_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    let config = parse_config(&content)
        .with_context(|| format!("Configuration invalide dans {}", path.display()))?;
    log::debug!("Configuration chargée depuis {}", path.display());
    Ok(config)
}

/// Parse TOML text and merge it over the defaults.
///
/// # Errors
/// Returns an error on malformed TOML or an invalid merged configuration.
pub fn parse_config(content: &str) -> Result<AppConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;
    let mut config = AppConfig::default();

    if let Some(r) = file.render {
        if let Some(v) = r.ramp {
            config.render.ramp = v;
        }
        if let Some(v) = r.invert {
            config.render.invert = v;
        }
    }
    if let Some(t) = file.tools {
        if let Some(v) = t.ffmpeg {
            config.tools.ffmpeg = v;
        }
        if let Some(v) = t.ffprobe {
            config.tools.ffprobe = v;
        }
    }
    if let Some(a) = file.audio {
        if let Some(v) = a.enabled {
            config.audio.enabled = v;
        }
        if a.player.is_some() {
            config.audio.player = a.player;
        }
    }
    if let Some(p) = file.playback
        && let Some(v) = p.hide_cursor
    {
        config.playback.hide_cursor = v;
    }

    config.validate()?;
    Ok(config)
}
