use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Extensions image reconnues.
const IMAGE_EXTS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];

/// Liste les images d'un dossier de frames, triées lexicographiquement.
///
/// The transcoder numbers frames with zero padding (`frame_000001.png`), so
/// lexicographic order is display order. Sub-directories and non-image
/// files are ignored.
///
/// # Errors
/// Returns an error if the directory cannot be read.
///
/// # Example
/// ```no_run
/// use reel_source::folder::list_frames;
/// use std::path::Path;
/// let frames = list_frames(Path::new("clip.out/clip.frames")).unwrap();
/// ```
pub fn list_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries =
        fs::read_dir(dir).with_context(|| format!("Impossible de lire {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && is_image(&path) {
            files.push(path);
        }
    }
    files.sort();
    log::debug!("{} frames trouvées dans {}", files.len(), dir.display());
    Ok(files)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| IMAGE_EXTS.contains(&ext.to_lowercase().as_str()))
}
