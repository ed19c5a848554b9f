use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Terminal failures for a single load attempt. The caller keeps whatever
/// mesh it was already displaying; no partial mesh is ever produced.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not open {path:?}: {source}")]
    MissingFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid STL file: {0}")]
    BadStl(String),
}

/// Non-fatal diagnostics raised alongside a successfully loaded mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoadWarning {
    /// Binary STL whose 80-byte header happens to begin with `solid `.
    /// The mesh loads fine here, but other tools may mistake the file for
    /// ASCII STL and fail on it.
    #[error("binary STL with a header that starts with \"solid\"; other tools may misread it")]
    ConfusingStl,

    /// Structurally valid STL that declares zero triangles.
    #[error("file contains no triangles")]
    EmptyMesh,
}
