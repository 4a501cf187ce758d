use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use reel_core::frame::{Animation, Frame};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Version du format écrit par [`save`]. Les documents sans champ `version`
/// sont lus comme version 1.
pub const FORMAT_VERSION: u64 = 1;

/// Errors originating from the animation store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No document at the given path.
    #[error("Animation introuvable : {}", .0.display())]
    NotFound(PathBuf),

    /// The document exists but is not a usable animation.
    #[error("Animation corrompue ({}) : {reason}", .path.display())]
    Corrupt {
        /// Document path.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },

    /// The document is readable but its structure is not the one expected.
    #[error("Format d'animation incompatible ({}) : {reason}", .path.display())]
    SchemaMismatch {
        /// Document path.
        path: PathBuf,
        /// Missing field or unsupported version.
        reason: String,
    },

    /// Read, write or rename failure.
    #[error("Erreur I/O sur l'animation : {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct DocumentOut<'a> {
    version: u64,
    frame_rate: f64,
    frames: Vec<&'a [String]>,
}

#[derive(Deserialize)]
struct DocumentIn {
    frame_rate: f64,
    frames: Vec<Vec<String>>,
}

/// Write `animation` to `path`, replacing any previous document atomically.
///
/// The JSON is written to a temporary file in the destination directory,
/// synced, then renamed over `path`. A failure at any step leaves the
/// previous document (or no document) in place.
///
/// # Errors
/// [`StoreError::Io`] if the directory is not writable or the rename fails.
///
/// # Example
/// ```
/// use reel_core::frame::{Animation, Frame};
/// use reel_export::store::{load, save};
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("clip.json");
/// let anim = Animation::new(24.0, vec![Frame::new(vec!["@ ".into()]).unwrap()]).unwrap();
/// save(&path, &anim).unwrap();
/// assert_eq!(load(&path).unwrap(), anim);
/// ```
pub fn save(path: &Path, animation: &Animation) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let doc = DocumentOut {
        version: FORMAT_VERSION,
        frame_rate: animation.frame_rate(),
        frames: animation.frames().iter().map(Frame::rows).collect(),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer(&mut writer, &doc).map_err(std::io::Error::from)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    // En cas d'échec, le temporaire est supprimé au drop de l'erreur.
    tmp.persist(path).map_err(|e| e.error)?;

    log::info!(
        "Animation enregistrée : {} ({} frames à {} fps)",
        path.display(),
        animation.len(),
        animation.frame_rate()
    );
    Ok(())
}

/// Read an animation document.
///
/// # Errors
/// - [`StoreError::NotFound`] if `path` does not exist;
/// - [`StoreError::SchemaMismatch`] if `frame_rate` or `frames` is missing, or
///   the document declares an unsupported `version`;
/// - [`StoreError::Corrupt`] if the content is not JSON, a field has the wrong
///   type, or the frames cannot form an [`Animation`] (ragged rows, frames of
///   different sizes, non-positive frame rate);
/// - [`StoreError::Io`] for other read failures.
pub fn load(path: &Path) -> Result<Animation, StoreError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            return Err(corrupt(path, "contenu non UTF-8"));
        }
        Err(e) => return Err(e.into()),
    };

    let value: Value = serde_json::from_str(&text).map_err(|e| corrupt(path, e))?;
    let Value::Object(fields) = &value else {
        return Err(corrupt(path, "la racine n'est pas un objet JSON"));
    };

    // Structure d'abord : un champ absent n'est pas une corruption.
    if let Some(version) = fields.get("version") {
        let version = version
            .as_u64()
            .ok_or_else(|| corrupt(path, "`version` n'est pas un entier positif"))?;
        if version == 0 || version > FORMAT_VERSION {
            return Err(mismatch(
                path,
                format!("version {version} non supportée (maximum {FORMAT_VERSION})"),
            ));
        }
    }
    for field in ["frame_rate", "frames"] {
        if !fields.contains_key(field) {
            return Err(mismatch(path, format!("champ `{field}` absent")));
        }
    }

    let doc: DocumentIn = serde_json::from_value(value).map_err(|e| corrupt(path, e))?;
    let frames = doc
        .frames
        .into_iter()
        .enumerate()
        .map(|(i, rows)| Frame::new(rows).map_err(|e| corrupt(path, format!("frame {i} : {e}"))))
        .collect::<Result<Vec<_>, _>>()?;
    let animation = Animation::new(doc.frame_rate, frames).map_err(|e| corrupt(path, e))?;

    log::debug!(
        "Animation chargée : {} ({} frames à {} fps)",
        path.display(),
        animation.len(),
        animation.frame_rate()
    );
    Ok(animation)
}

fn corrupt(path: &Path, reason: impl ToString) -> StoreError {
    StoreError::Corrupt {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn mismatch(path: &Path, reason: String) -> StoreError {
    StoreError::SchemaMismatch {
        path: path.to_path_buf(),
        reason,
    }
}
