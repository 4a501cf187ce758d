// Les deux commandes de l'outil :
//   - build : vidéo → (ré-échantillonnage) → audio + frames grises → animation JSON
//   - play  : dossier de sortie → animation + piste audio → Player
//
// Chargement et conversion des frames affichent une barre de progression.
//
// Chaque étape ajoute son nom au contexte d'erreur (transcoding, mapping,
// saving, loading, rendering) : le message final dit où ça a cassé.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reel_ascii::encoder::build_animation;
use reel_audio::{AudioLauncher, SilentLauncher, launcher_from_settings};
use reel_core::config::AppConfig;
use reel_core::frame::LuminanceGrid;
use reel_render::{PlaybackReport, Player, StopSignal};
use reel_source::folder::list_frames;
use reel_source::image::load_luminance;
use reel_source::video::{FrameSize, Transcoder};

use crate::cli::{BuildArgs, PlayArgs};
use crate::progress;

/// Fichiers produits par `build` pour une vidéo `<stem>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputLayout {
    dir: PathBuf,
    stem: String,
}

impl OutputLayout {
    /// Layout rooted at `dir`, files named after `stem`.
    #[must_use]
    pub fn new(dir: PathBuf, stem: impl Into<String>) -> Self {
        Self {
            dir,
            stem: stem.into(),
        }
    }

    /// Output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<stem>.json`
    #[must_use]
    pub fn document(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.stem))
    }

    /// `<stem>.wav`
    #[must_use]
    pub fn track(&self) -> PathBuf {
        self.dir.join(format!("{}.wav", self.stem))
    }

    /// `<stem>.frames/`
    #[must_use]
    pub fn frames_dir(&self) -> PathBuf {
        self.dir.join(format!("{}.frames", self.stem))
    }

    /// `<stem>.<fps>fps.mp4`
    #[must_use]
    pub fn retimed_video(&self, fps: u32) -> PathBuf {
        self.dir.join(format!("{}.{fps}fps.mp4", self.stem))
    }
}

/// Résumé d'un `build` réussi.
#[derive(Debug)]
pub struct BuildSummary {
    /// Files written.
    pub layout: OutputLayout,
    /// Number of frames encoded.
    pub frames: usize,
    /// Frame rate stored in the document.
    pub frame_rate: f64,
    /// `true` if `<stem>.wav` was produced.
    pub has_audio: bool,
}

/// File stem of `path`, or an error naming it.
fn stem_of(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .with_context(|| format!("Nom de fichier inexploitable : {}", path.display()))
}

/// Dossier de sortie : `--out`, sinon `<dossier de la vidéo>/<stem>.out`.
///
/// # Errors
/// Returns an error if the video path has no usable file name.
pub fn output_dir(video: &Path, out: Option<&Path>) -> Result<PathBuf> {
    if let Some(out) = out {
        return Ok(out.to_path_buf());
    }
    let stem = stem_of(video)?;
    let parent = video.parent().unwrap_or_else(|| Path::new("."));
    Ok(parent.join(format!("{stem}.out")))
}

/// Crée le dossier de sortie. Un dossier existant n'est remplacé qu'avec `overwrite`.
///
/// # Errors
/// Returns an error if `dir` exists and `overwrite` is false, or on I/O failure.
pub fn prepare_output_dir(dir: &Path, overwrite: bool) -> Result<()> {
    if dir.exists() {
        if !overwrite {
            anyhow::bail!(
                "Le dossier de sortie {} existe déjà (utilisez --overwrite pour le remplacer)",
                dir.display()
            );
        }
        log::info!("Suppression de l'ancien dossier {}", dir.display());
        fs::remove_dir_all(dir)
            .with_context(|| format!("Impossible de supprimer {}", dir.display()))?;
    }
    fs::create_dir_all(dir).with_context(|| format!("Impossible de créer {}", dir.display()))
}

/// `termreel build`.
///
/// # Errors
/// Returns an error naming the failing stage.
pub fn run_build(args: &BuildArgs, config: &AppConfig) -> Result<BuildSummary> {
    args.validate()?;
    // Rampe validée avant tout travail coûteux.
    let ramp = config.glyph_ramp().context("mapping : rampe de glyphes invalide")?;

    let video = args
        .video
        .canonicalize()
        .with_context(|| format!("Vidéo introuvable : {}", args.video.display()))?;
    let dir = output_dir(&video, args.out.as_deref())?;
    let layout = OutputLayout::new(dir, stem_of(&video)?);
    prepare_output_dir(layout.dir(), args.overwrite)?;

    let transcoder = Transcoder::from_settings(&config.tools);
    let (source, frame_rate) = match args.fps {
        Some(fps) => {
            let retimed = layout.retimed_video(fps);
            transcoder
                .change_frame_rate(&video, &retimed, fps)
                .context("transcoding : ré-échantillonnage impossible")?;
            (retimed, f64::from(fps))
        }
        None => {
            let fps = transcoder
                .probe_frame_rate(&video)
                .context("transcoding : fréquence d'images illisible")?;
            (video.clone(), fps)
        }
    };

    if !args.no_audio {
        transcoder
            .extract_audio(&source, &layout.track())
            .context("transcoding : extraction audio impossible (--no-audio pour l'ignorer)")?;
    }

    let frames_dir = layout.frames_dir();
    fs::create_dir_all(&frames_dir)
        .with_context(|| format!("Impossible de créer {}", frames_dir.display()))?;
    let size = FrameSize {
        width: args.width,
        height: args.height,
    };
    transcoder
        .extract_grayscale_frames(&source, &frames_dir, size)
        .context("transcoding : extraction des frames impossible")?;

    let grids = load_grids(&frames_dir).context("loading : lecture des frames extraites")?;
    let pb = progress::frame_bar(grids.len(), "Conversion");
    let animation = build_animation(frame_rate, &grids, &ramp, || pb.inc(1));
    pb.finish_and_clear();
    let animation = animation.context("mapping : conversion en caractères")?;
    reel_export::save(&layout.document(), &animation).context("saving : écriture de l'animation")?;

    if !args.keep_frames {
        fs::remove_dir_all(&frames_dir)
            .with_context(|| format!("Impossible de supprimer {}", frames_dir.display()))?;
    }

    Ok(BuildSummary {
        frames: animation.len(),
        frame_rate,
        has_audio: !args.no_audio,
        layout,
    })
}

fn load_grids(frames_dir: &Path) -> Result<Vec<LuminanceGrid>> {
    let paths = list_frames(frames_dir)?;
    log::info!("Chargement de {} frames depuis {}", paths.len(), frames_dir.display());
    let pb = progress::frame_bar(paths.len(), "Chargement");
    let grids = paths
        .iter()
        .map(|p| {
            let grid = load_luminance(p);
            pb.inc(1);
            grid
        })
        .collect();
    pb.finish_and_clear();
    grids
}

/// Document d'animation et piste audio à jouer.
#[derive(Debug, PartialEq, Eq)]
pub struct PlayTarget {
    /// `.json` document.
    pub document: PathBuf,
    /// `.wav` next to it, when present.
    pub track: Option<PathBuf>,
}

/// Trouve le document d'animation désigné par `target`.
///
/// A `.json` file is used as is. For a directory, `<dir-stem>.json` is
/// preferred (`clip.out` → `clip.json`), then the only `.json` inside. The
/// audio track is the `.wav` with the document's stem; its absence only
/// warns.
///
/// # Errors
/// Returns an error if no single document can be identified.
pub fn locate(target: &Path) -> Result<PlayTarget> {
    let document = if target.is_dir() {
        find_document(target)?
    } else if target.is_file() {
        target.to_path_buf()
    } else {
        anyhow::bail!("Introuvable : {}", target.display());
    };

    let track = document.with_extension("wav");
    let track = if track.is_file() {
        Some(track)
    } else {
        log::warn!("Pas de piste audio ({}), lecture muette", track.display());
        None
    };
    Ok(PlayTarget { document, track })
}

fn find_document(dir: &Path) -> Result<PathBuf> {
    let preferred = dir.join(format!("{}.json", stem_of(dir)?));
    if preferred.is_file() {
        return Ok(preferred);
    }
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Impossible de lire {}", dir.display()))?
        .filter_map(std::result::Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.is_file() && p.extension().is_some_and(|e| e.eq_ignore_ascii_case("json"))
        })
        .collect();
    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        0 => anyhow::bail!("Aucune animation (.json) dans {}", dir.display()),
        n => anyhow::bail!(
            "{n} documents .json dans {} : indiquez le fichier à jouer",
            dir.display()
        ),
    }
}

/// `termreel play`, with `out` as the terminal.
///
/// # Errors
/// Returns an error naming the failing stage (`loading` or `rendering`).
pub fn run_play<W: Write>(
    args: &PlayArgs,
    config: &AppConfig,
    out: W,
    stop: StopSignal,
) -> Result<PlaybackReport> {
    let target = locate(&args.target).context("loading : animation introuvable")?;
    let animation =
        reel_export::load(&target.document).context("loading : lecture de l'animation")?;

    let muted = args.mute || !config.audio.enabled;
    let launcher: Box<dyn AudioLauncher> = if muted {
        Box::new(SilentLauncher)
    } else {
        launcher_from_settings(&config.audio)
    };
    let track = if muted { None } else { target.track.as_deref() };
    log::info!("Lecteur audio : {}", launcher.name());

    let frame_bytes = animation
        .frames()
        .first()
        .map_or(0, |f| f.rows().iter().map(|r| r.len() + 1).sum::<usize>());
    let out = BufWriter::with_capacity(frame_bytes.max(8 * 1024), out);

    let mut player = Player::new(out, launcher)
        .hide_cursor(config.playback.hide_cursor)
        .with_stop_signal(stop);
    player
        .play(&animation, track)
        .context("rendering : lecture interrompue")
}
