use std::path::Path;
use std::process::{Command, Stdio};

use reel_core::config::AudioSettings;

use crate::error::AudioError;
use crate::handle::{AudioHandle, PlayerProcess};

/// Démarre la lecture d'une piste audio dans un processus indépendant.
///
/// One implementation per platform is selected at startup
/// ([`platform_launcher`]) and injected into the player, so the render loop
/// never branches on the operating system.
///
/// # Example
/// ```
/// use reel_audio::launcher::{AudioLauncher, SilentLauncher};
/// use std::path::Path;
///
/// let launcher = SilentLauncher;
/// let handle = launcher.launch(Path::new("clip.wav")).unwrap();
/// assert!(!handle.is_active());
/// ```
pub trait AudioLauncher: Send + Sync {
    /// Start playing `track` and return immediately, without waiting for the
    /// player to report that playback started.
    ///
    /// # Errors
    /// [`AudioError::TrackNotFound`] or [`AudioError::Spawn`].
    fn launch(&self, track: &Path) -> Result<AudioHandle, AudioError>;

    /// Nom lisible pour les logs.
    fn name(&self) -> &str;
}

/// Lecteur externe : `program args... <track>`.
///
/// # Example
/// ```
/// use reel_audio::launcher::{AudioLauncher, CommandLauncher};
/// let launcher = CommandLauncher::new("mpv", ["--no-video", "--really-quiet"]);
/// assert_eq!(launcher.name(), "mpv");
/// ```
#[derive(Clone, Debug)]
pub struct CommandLauncher {
    program: String,
    args: Vec<String>,
}

impl CommandLauncher {
    /// Player invoked as `program args... <track>`.
    #[must_use]
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Build from a command vector (`[program, args...]`). `None` if empty.
    #[must_use]
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program.clone(), args.iter().cloned()))
    }

    /// Arguments placed before the track path.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl AudioLauncher for CommandLauncher {
    fn launch(&self, track: &Path) -> Result<AudioHandle, AudioError> {
        if !track.is_file() {
            return Err(AudioError::TrackNotFound(track.to_path_buf()));
        }
        let spawn_err = |source| AudioError::Spawn {
            program: self.program.clone(),
            source,
        };
        let stderr_file = tempfile::tempfile().map_err(spawn_err)?;
        let stderr = stderr_file.try_clone().map_err(spawn_err)?;

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(track)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr));
        // Groupe de processus à part : le Ctrl-C du terminal n'atteint que nous,
        // le lecteur est arrêté par le handle.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        let child = command.spawn().map_err(spawn_err)?;

        log::info!(
            "Lecteur audio {} lancé (pid {}) : {}",
            self.program,
            child.id(),
            track.display()
        );
        Ok(AudioHandle::new(Box::new(PlayerProcess::new(
            self.program.clone(),
            child,
            Some(stderr_file),
        ))))
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Aucun son : la lecture se fait en silence.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentLauncher;

impl AudioLauncher for SilentLauncher {
    fn launch(&self, track: &Path) -> Result<AudioHandle, AudioError> {
        log::debug!("Audio désactivé, piste ignorée : {}", track.display());
        Ok(AudioHandle::detached())
    }

    fn name(&self) -> &str {
        "silent"
    }
}

/// Lecteur natif de la plateforme.
///
/// macOS ships `afplay`; elsewhere `ffplay`, installed alongside the ffmpeg
/// binaries the build step already requires.
#[must_use]
pub fn platform_launcher() -> CommandLauncher {
    #[cfg(target_os = "macos")]
    {
        CommandLauncher::new("afplay", ["-q", "1"])
    }
    #[cfg(not(target_os = "macos"))]
    {
        CommandLauncher::new("ffplay", ["-nodisp", "-autoexit", "-loglevel", "quiet"])
    }
}

/// Lecteur choisi par la section `[audio]` de la configuration.
#[must_use]
pub fn launcher_from_settings(settings: &AudioSettings) -> Box<dyn AudioLauncher> {
    if !settings.enabled {
        return Box::new(SilentLauncher);
    }
    match settings.player.as_deref().and_then(CommandLauncher::from_command) {
        Some(custom) => Box::new(custom),
        None => Box::new(platform_launcher()),
    }
}
