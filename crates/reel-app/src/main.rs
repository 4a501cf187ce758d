use std::io::IsTerminal;

use anyhow::{Context, Result};
use clap::Parser;
use reel_core::config::AppConfig;

pub mod cli;
pub mod pipeline;
pub mod progress;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging (stderr, silencieux par défaut pendant la lecture)
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger la config puis appliquer les overrides CLI
    let mut config = resolve_config(&cli)?;
    apply_overrides(&cli, &mut config);
    config.validate().context("mapping : configuration invalide")?;

    match &cli.command {
        cli::Command::Build(args) => {
            let summary = pipeline::run_build(args, &config)?;
            log::info!(
                "{} frames à {:.3} fps{}",
                summary.frames,
                summary.frame_rate,
                if summary.has_audio { " + audio" } else { "" }
            );
            println!("{}", summary.layout.dir().display());
        }
        cli::Command::Play(args) => {
            if !std::io::stdout().is_terminal() {
                log::warn!("Sortie hors terminal : séquences d'échappement écrites telles quelles");
            }
            // 4. Ctrl-C → arrêt propre (audio coupé, curseur restauré)
            let (stop_handle, stop_signal) = reel_render::stop_channel();
            ctrlc::set_handler(move || stop_handle.stop())
                .context("Impossible d'installer le gestionnaire Ctrl-C")?;

            let report =
                pipeline::run_play(args, &config, std::io::stdout().lock(), stop_signal)?;
            log::info!(
                "{:?} : {} frames, {:.2} fps effectifs",
                report.outcome,
                report.frames_rendered,
                report.effective_fps()
            );
        }
    }
    Ok(())
}

/// Config file if present, defaults otherwise.
fn resolve_config(cli: &cli::Cli) -> Result<AppConfig> {
    if cli.config.exists() {
        reel_core::config::load_config(&cli.config)
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        Ok(AppConfig::default())
    }
}

/// Flags de ligne de commande prioritaires sur le fichier.
fn apply_overrides(cli: &cli::Cli, config: &mut AppConfig) {
    if let Some(ffmpeg) = &cli.ffmpeg {
        config.tools.ffmpeg.clone_from(ffmpeg);
    }
    if let Some(ffprobe) = &cli.ffprobe {
        config.tools.ffprobe.clone_from(ffprobe);
    }
    match &cli.command {
        cli::Command::Build(args) => {
            if let Some(ramp) = &args.ramp {
                config.render.ramp.clone_from(ramp);
            }
            if args.invert {
                config.render.invert = true;
            }
        }
        cli::Command::Play(args) => {
            if args.mute {
                config.audio.enabled = false;
            }
        }
    }
}
