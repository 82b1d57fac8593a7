//! Scene errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("unknown node {0}")]
    UnknownNode(u64),
    #[error("failed to write overlay image: {0}")]
    Image(#[from] image::ImageError),
}
