// ffmpeg et ffprobe sont pilotés en sous-processus (std::process::Command),
// aucune liaison FFI. Prérequis : les deux exécutables accessibles (PATH ou
// chemin absolu dans [tools]).
//
// Architecture :
//   - `probe_frame_rate`         : ffprobe → r_frame_rate du flux vidéo principal
//   - `change_frame_rate`        : ré-encode la vidéo à une fréquence fixe
//   - `extract_audio`            : première piste audio → fichier (wav)
//   - `extract_grayscale_frames` : frames redimensionnées en niveaux de gris → PNG numérotés
//   - `run`                      : lance, attend, remonte stderr si code ≠ 0

use std::path::Path;
use std::process::{Command, Output, Stdio};

use anyhow::{Context, Result};
use reel_core::config::ToolSettings;
use reel_core::error::CoreError;

/// Motif de nommage des frames extraites (6 chiffres : tri lexicographique = ordre temporel).
pub const FRAME_PATTERN: &str = "frame_%06d.png";

/// Nombre maximal de lignes de stderr conservées dans une erreur.
const STDERR_TAIL_LINES: usize = 20;

/// Target size of extracted frames, in characters.
///
/// `width: None` keeps the source aspect ratio (`-1` for ffmpeg's scaler).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSize {
    /// Columns, or `None` to follow the aspect ratio.
    pub width: Option<u32>,
    /// Rows.
    pub height: u32,
}

impl FrameSize {
    /// Filtre ffmpeg `scale=W:H,format=gray`.
    ///
    /// # Example
    /// ```
    /// use reel_source::video::FrameSize;
    /// let size = FrameSize { width: None, height: 48 };
    /// assert_eq!(size.filter(), "scale=-1:48,format=gray");
    /// ```
    #[must_use]
    pub fn filter(&self) -> String {
        let w = self.width.map_or_else(|| "-1".to_string(), |w| w.to_string());
        format!("scale={w}:{},format=gray", self.height)
    }
}

/// Handle on the ffmpeg/ffprobe executables.
///
/// # Example
/// ```
/// use reel_core::config::ToolSettings;
/// use reel_source::video::Transcoder;
/// let t = Transcoder::from_settings(&ToolSettings::default());
/// assert_eq!(t.ffmpeg(), "ffmpeg");
/// ```
#[derive(Clone, Debug)]
pub struct Transcoder {
    ffmpeg: String,
    ffprobe: String,
}

impl Transcoder {
    /// Transcoder using the given executables.
    #[must_use]
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    /// Transcoder from the `[tools]` configuration section.
    #[must_use]
    pub fn from_settings(tools: &ToolSettings) -> Self {
        Self::new(&tools.ffmpeg, &tools.ffprobe)
    }

    /// ffmpeg executable.
    #[must_use]
    pub fn ffmpeg(&self) -> &str {
        &self.ffmpeg
    }

    /// ffprobe executable.
    #[must_use]
    pub fn ffprobe(&self) -> &str {
        &self.ffprobe
    }

    /// Interroge ffprobe pour la fréquence d'images du flux vidéo principal.
    ///
    /// # Errors
    /// Returns an error if ffprobe cannot be launched, exits with a failure
    /// ([`CoreError::ExternalProcess`]), or prints no usable `r_frame_rate`.
    pub fn probe_frame_rate(&self, video: &Path) -> Result<f64> {
        let video_str = utf8(video)?;
        let output = run(
            &self.ffprobe,
            &[
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=r_frame_rate",
                "-of",
                "csv=p=0",
                video_str,
            ],
        )?;
        let text = String::from_utf8_lossy(&output.stdout);
        let fps = text
            .lines()
            .map(|l| l.trim().trim_end_matches(','))
            .find_map(parse_rational)
            .with_context(|| {
                format!(
                    "ffprobe n'a trouvé aucune fréquence d'images dans {} (sortie : {:?})",
                    video.display(),
                    text.trim()
                )
            })?;
        log::info!("Fréquence d'images : {fps:.3} fps — {}", video.display());
        Ok(fps)
    }

    /// Ré-encode `src` dans `dst` à `fps` images par seconde.
    ///
    /// # Errors
    /// Returns an error if ffmpeg cannot be launched or fails.
    pub fn change_frame_rate(&self, src: &Path, dst: &Path, fps: u32) -> Result<()> {
        let filter = format!("fps=fps={fps}");
        run(
            &self.ffmpeg,
            &[
                "-y",
                "-hide_banner",
                "-loglevel",
                "error",
                "-i",
                utf8(src)?,
                "-filter:v",
                &filter,
                utf8(dst)?,
            ],
        )?;
        log::info!("Vidéo ré-échantillonnée à {fps} fps : {}", dst.display());
        Ok(())
    }

    /// Extrait la première piste audio de `src` dans `dst` (format déduit de l'extension).
    ///
    /// # Errors
    /// Returns an error if ffmpeg cannot be launched or fails (e.g. no audio stream).
    pub fn extract_audio(&self, src: &Path, dst: &Path) -> Result<()> {
        run(
            &self.ffmpeg,
            &[
                "-y",
                "-hide_banner",
                "-loglevel",
                "error",
                "-i",
                utf8(src)?,
                "-map",
                "a:0",
                "-vn",
                utf8(dst)?,
            ],
        )?;
        log::info!("Piste audio extraite : {}", dst.display());
        Ok(())
    }

    /// Extrait toutes les frames de `src`, redimensionnées et en niveaux de gris,
    /// dans `dst_dir` (`frame_000001.png`, ...).
    ///
    /// # Errors
    /// Returns an error if ffmpeg cannot be launched or fails.
    pub fn extract_grayscale_frames(
        &self,
        src: &Path,
        dst_dir: &Path,
        size: FrameSize,
    ) -> Result<()> {
        let pattern = dst_dir.join(FRAME_PATTERN);
        let filter = size.filter();
        run(
            &self.ffmpeg,
            &[
                "-y",
                "-hide_banner",
                "-loglevel",
                "error",
                "-i",
                utf8(src)?,
                "-vf",
                &filter,
                utf8(&pattern)?,
            ],
        )?;
        log::info!("Frames extraites dans {}", dst_dir.display());
        Ok(())
    }
}

/// Parse `"30000/1001"`, `"25/1"` ou `"24"` en fréquence strictement positive.
///
/// # Example
/// ```
/// use reel_source::video::parse_rational;
/// assert_eq!(parse_rational("25/1"), Some(25.0));
/// assert_eq!(parse_rational("0/0"), None);
/// ```
#[must_use]
pub fn parse_rational(text: &str) -> Option<f64> {
    let mut parts = text.trim().splitn(2, '/');
    let num: f64 = parts.next()?.trim().parse().ok()?;
    let den: f64 = match parts.next() {
        Some(d) => d.trim().parse().ok()?,
        None => 1.0,
    };
    let fps = num / den;
    (den > 0.0 && fps.is_finite() && fps > 0.0).then_some(fps)
}

/// Lance `program args...`, attend sa fin, et convertit un code de sortie
/// non nul en [`CoreError::ExternalProcess`] avec la fin de stderr.
fn run(program: &str, args: &[&str]) -> Result<Output> {
    log::info!("Exécution : {program} {}", args.join(" "));
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| {
            format!("Impossible de lancer {program}. Vérifiez qu'il est installé et dans le PATH.")
        })?;

    if !output.status.success() {
        return Err(CoreError::ExternalProcess {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr: stderr_tail(&output.stderr),
        }
        .into());
    }
    Ok(output)
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

fn utf8(path: &Path) -> Result<&str> {
    path.to_str()
        .with_context(|| format!("Chemin invalide (non-UTF8) : {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rational_frame_rates() {
        assert_eq!(parse_rational("24"), Some(24.0));
        let ntsc = parse_rational("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.001);
        assert_eq!(parse_rational(" 60/1 "), Some(60.0));
        assert_eq!(parse_rational("25/0"), None);
        assert_eq!(parse_rational("-25/1"), None);
        assert_eq!(parse_rational("N/A"), None);
        assert_eq!(parse_rational(""), None);
    }

    #[test]
    fn filter_with_explicit_width() {
        let size = FrameSize {
            width: Some(120),
            height: 40,
        };
        assert_eq!(size.filter(), "scale=120:40,format=gray");
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let text: String = (0..50).map(|i| format!("line {i}\n")).collect();
        let tail = stderr_tail(text.as_bytes());
        assert!(tail.starts_with("line 30"));
        assert!(tail.ends_with("line 49"));
    }

    #[test]
    fn missing_executable_is_reported() {
        let t = Transcoder::new("/nonexistent/ffmpeg", "/nonexistent/ffprobe");
        let err = t.probe_frame_rate(Path::new("clip.mp4")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/ffprobe"));
    }

    #[cfg(unix)]
    mod fake_tools {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use std::path::PathBuf;

        fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
            let path = dir.join(name);
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn probe_parses_ffprobe_output() {
            let dir = tempfile::tempdir().unwrap();
            let probe = script(dir.path(), "ffprobe", "echo '30000/1001,'");
            let t = Transcoder::new("ffmpeg", probe.to_str().unwrap());
            let fps = t.probe_frame_rate(Path::new("clip.mp4")).unwrap();
            assert!((fps - 29.97).abs() < 0.001);
        }

        #[test]
        fn failing_tool_surfaces_stderr() {
            let dir = tempfile::tempdir().unwrap();
            let ffmpeg = script(
                dir.path(),
                "ffmpeg",
                "echo 'Stream map matches no streams' >&2; exit 1",
            );
            let t = Transcoder::new(ffmpeg.to_str().unwrap(), "ffprobe");
            let err = t
                .extract_audio(Path::new("clip.mp4"), &dir.path().join("clip.wav"))
                .unwrap_err();
            match err.downcast_ref::<CoreError>() {
                Some(CoreError::ExternalProcess { stderr, .. }) => {
                    assert!(stderr.contains("matches no streams"));
                }
                other => panic!("erreur inattendue : {other:?}"),
            }
        }

        #[test]
        fn frame_extraction_arguments() {
            let dir = tempfile::tempdir().unwrap();
            let log = dir.path().join("args.txt");
            let ffmpeg = script(
                dir.path(),
                "ffmpeg",
                &format!("echo \"$@\" > '{}'", log.display()),
            );
            let t = Transcoder::new(ffmpeg.to_str().unwrap(), "ffprobe");
            let size = FrameSize {
                width: None,
                height: 30,
            };
            t.extract_grayscale_frames(Path::new("clip.mp4"), dir.path(), size)
                .unwrap();
            let args = fs::read_to_string(&log).unwrap();
            assert!(args.contains("-i clip.mp4"));
            assert!(args.contains("-vf scale=-1:30,format=gray"));
            assert!(args.trim_end().ends_with("frame_%06d.png"));
        }
    }
}
