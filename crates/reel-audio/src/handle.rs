use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::process::{Child, ExitStatus};

use reel_core::error::CoreError;

use crate::error::AudioError;

/// A running audio player that can be stopped.
///
/// Implemented by [`PlayerProcess`] for OS processes; tests provide fakes.
pub trait AudioProcess: Send {
    /// Signal the player to stop and wait for it to exit.
    ///
    /// # Errors
    /// [`AudioError::Player`] if the player had already failed on its own,
    /// [`AudioError::Io`] if signalling or waiting fails.
    fn terminate(&mut self) -> Result<(), AudioError>;

    /// OS process id, if any.
    fn id(&self) -> Option<u32>;
}

/// Processus lecteur lancé par un [`crate::launcher::CommandLauncher`].
///
/// stderr est redirigé vers un fichier temporaire : rien à vider pendant la
/// lecture, et le diagnostic reste disponible si le lecteur échoue.
pub struct PlayerProcess {
    program: String,
    child: Child,
    stderr: Option<File>,
}

impl PlayerProcess {
    /// Wrap a spawned child. `stderr` is the file its stderr was redirected to.
    #[must_use]
    pub fn new(program: String, child: Child, stderr: Option<File>) -> Self {
        Self {
            program,
            child,
            stderr,
        }
    }

    fn captured_stderr(&mut self) -> String {
        let Some(mut file) = self.stderr.take() else {
            return String::new();
        };
        let mut text = String::new();
        if file.seek(SeekFrom::Start(0)).is_ok() {
            let _ = file.read_to_string(&mut text);
        }
        text.trim().to_string()
    }
}

impl AudioProcess for PlayerProcess {
    fn terminate(&mut self) -> Result<(), AudioError> {
        // Déjà sorti de lui-même (fin de piste ou échec) ?
        if let Some(status) = self.child.try_wait()? {
            log::debug!("Lecteur audio {} déjà terminé : {status}", self.program);
            if status.success() {
                return Ok(());
            }
            if stopped_from_outside(status) {
                log::info!("Lecteur audio {} interrompu ({status})", self.program);
                return Ok(());
            }
            return Err(CoreError::ExternalProcess {
                program: self.program.clone(),
                status: status.to_string(),
                stderr: self.captured_stderr(),
            }
            .into());
        }
        if let Err(e) = self.child.kill() {
            // InvalidInput : sorti entre try_wait et kill.
            if e.kind() != std::io::ErrorKind::InvalidInput {
                return Err(e.into());
            }
        }
        let status = self.child.wait()?;
        log::debug!("Lecteur audio {} arrêté : {status}", self.program);
        Ok(())
    }

    fn id(&self) -> Option<u32> {
        Some(self.child.id())
    }
}

/// Hangup, interrupt, kill or terminate: the player was told to stop, it did
/// not fail. Any other signal (segfault, abort) still counts as a failure.
#[cfg(unix)]
fn stopped_from_outside(status: ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    matches!(status.signal(), Some(1 | 2 | 9 | 15))
}

#[cfg(not(unix))]
fn stopped_from_outside(_status: ExitStatus) -> bool {
    false
}

/// Possession exclusive d'un lecteur audio pour une session de lecture.
///
/// The player is terminated and awaited at most once: by [`AudioHandle::release`]
/// or, if that was never called, when the handle is dropped. Every exit path
/// of the owner (return, `?`, panic unwind) therefore stops the audio.
///
/// # Example
/// ```
/// use reel_audio::handle::AudioHandle;
/// let mut handle = AudioHandle::detached();
/// assert!(!handle.is_active());
/// handle.release().unwrap();
/// ```
pub struct AudioHandle {
    process: Option<Box<dyn AudioProcess>>,
}

impl AudioHandle {
    /// Take ownership of a running player.
    #[must_use]
    pub fn new(process: Box<dyn AudioProcess>) -> Self {
        Self {
            process: Some(process),
        }
    }

    /// Handle with no player behind it.
    #[must_use]
    pub fn detached() -> Self {
        Self { process: None }
    }

    /// `true` until the player has been released.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.process.is_some()
    }

    /// OS process id of the player, while active.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.process.as_ref().and_then(|p| p.id())
    }

    /// Stop the player now. Later calls (and the drop) do nothing.
    ///
    /// # Errors
    /// Propagates [`AudioProcess::terminate`] errors. The handle is released
    /// even when an error is returned.
    pub fn release(&mut self) -> Result<(), AudioError> {
        match self.process.take() {
            Some(mut process) => process.terminate(),
            None => Ok(()),
        }
    }
}

impl Drop for AudioHandle {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("Arrêt du lecteur audio : {e}");
        }
    }
}
