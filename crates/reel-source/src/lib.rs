//! External collaborators for termreel: image files as luminance grids,
//! frame directories, and the ffmpeg/ffprobe transcoder.

pub mod folder;
pub mod image;
pub mod video;
