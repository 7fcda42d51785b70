// Every variant states *where* things went wrong.
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Creating the window failed.
    #[error("window init error: {0}")]
    WindowInit(String),
    /// Updating the window buffer failed.
    #[error("window update error: {0}")]
    WindowUpdate(String),
    /// Opening/starting the camera failed.
    #[error("camera init error: {0}")]
    CameraInit(String),
    /// Grabbing/decoding a frame failed.
    #[error("camera frame error: {0}")]
    CameraFrame(String),

    #[error("missing sprite '{name}' (expected at {})", path.display())]
    MissingSprite { name: &'static str, path: PathBuf },
    #[error("cannot decode sprite {}", path.display())]
    SpriteDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot read config {}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config {}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Config(String),

    #[error("cannot spawn {name} thread")]
    Thread {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}
