//! Error taxonomy for the mesh.

use thiserror::Error;

use crate::messages::VertexId;

/// Errors surfaced by the mesh library.
///
/// Validation problems (malformed commands, out-of-range indices) are not
/// errors here: the controller answers them with the usage menu and keeps
/// going. `LinkClosed` is group-fatal only when the controller hits it; a
/// vertex actor retires the link locally instead.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The inbox behind a link is gone.
    #[error("link to vertex {0} is closed")]
    LinkClosed(VertexId),

    /// The external command channel failed.
    #[error("command channel error: {0}")]
    CommandChannel(#[from] std::io::Error),

    /// The actor group could not be brought up.
    #[error("failed to start actor group: {0}")]
    Spawn(String),
}

/// Result type alias for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;
