use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// termreel — vidéo en art ASCII, rejouée dans le terminal avec sa bande son.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Action à exécuter.
    #[command(subcommand)]
    pub command: Command,

    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, global = true, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Exécutable ffmpeg (remplace tools.ffmpeg).
    #[arg(long, global = true)]
    pub ffmpeg: Option<String>,

    /// Exécutable ffprobe (remplace tools.ffprobe).
    #[arg(long, global = true)]
    pub ffprobe: Option<String>,
}

/// Sous-commandes.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convertir une vidéo en animation ASCII + piste audio.
    Build(BuildArgs),
    /// Rejouer une animation construite par `build`.
    Play(PlayArgs),
}

/// Arguments de `termreel build`.
#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Vidéo source.
    pub video: PathBuf,

    /// Hauteur des frames, en caractères.
    #[arg(long)]
    pub height: u32,

    /// Largeur des frames, en caractères. Défaut : suit le ratio de la vidéo.
    #[arg(long)]
    pub width: Option<u32>,

    /// Ré-échantillonner la vidéo à cette fréquence avant extraction.
    #[arg(long)]
    pub fps: Option<u32>,

    /// Dossier de sortie. Défaut : <dossier de la vidéo>/<nom>.out
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Rampe de glyphes, du plus sombre au plus clair (remplace render.ramp).
    #[arg(long)]
    pub ramp: Option<String>,

    /// Inverser la rampe (fond clair).
    #[arg(long, default_value_t = false)]
    pub invert: bool,

    /// Remplacer le dossier de sortie s'il existe.
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,

    /// Conserver les images intermédiaires.
    #[arg(long, default_value_t = false)]
    pub keep_frames: bool,

    /// Ne pas extraire la piste audio.
    #[arg(long, default_value_t = false)]
    pub no_audio: bool,
}

impl BuildArgs {
    /// Reject sizes and rates ffmpeg would accept but that make no animation.
    ///
    /// # Errors
    /// Returns an error for a zero height, width or frame rate.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.height == 0 {
            anyhow::bail!("--height doit être > 0");
        }
        if self.width == Some(0) {
            anyhow::bail!("--width doit être > 0");
        }
        if self.fps == Some(0) {
            anyhow::bail!("--fps doit être > 0 (omettre pour garder la fréquence de la vidéo)");
        }
        Ok(())
    }
}

/// Arguments de `termreel play`.
#[derive(Args, Debug, Clone)]
pub struct PlayArgs {
    /// Dossier produit par `build`, ou document `.json` directement.
    pub target: PathBuf,

    /// Lecture sans son.
    #[arg(long, default_value_t = false)]
    pub mute: bool,
}
