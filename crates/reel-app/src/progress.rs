// Barres de progression du build, sur stderr.
//
// indicatif ne dessine rien quand stderr n'est pas un terminal : les logs
// redirigés restent propres.

use indicatif::{ProgressBar, ProgressStyle};

/// Barre de `total` frames précédée de `label`.
#[must_use]
pub fn frame_bar(total: usize, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    let template = format!(
        "{label:<11} {{bar:40.cyan/blue}} {{pos}}/{{len}} [{{elapsed_precise}}<{{eta_precise}}]"
    );
    match ProgressStyle::with_template(&template) {
        Ok(style) => pb.set_style(style.progress_chars("##-")),
        Err(e) => log::debug!("Style de progression ignoré : {e}"),
    }
    pb
}
