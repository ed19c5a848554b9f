//! Loader core for the stlview STL viewer.
//!
//! Parses binary and ASCII STL files, deduplicates the triangle soup into an
//! indexed [`Mesh`], and hands the result to the rendering layer. Loading
//! runs on a background worker via [`Loader`]; large files can use a
//! fork-join parallel sort for the dedup step.
//!
//! ```no_run
//! use std::path::Path;
//! use stlview_core::{load_stl, LoaderSettings};
//!
//! let loaded = load_stl(Path::new("model.stl"), &LoaderSettings::default()).unwrap();
//! println!("{} triangles", loaded.mesh.triangle_count());
//! ```

mod error;
mod indexer;
mod loader;
mod mesh;
mod settings;
mod stl_processor;
mod vertex;

pub use error::{LoadError, LoadWarning};
pub use indexer::{build_mesh, hardware_threads};
pub use loader::{load_stl, LoadedStl, Loader};
pub use mesh::{BoundingBox, Mesh};
pub use settings::LoaderSettings;
pub use stl_processor::{ParsedStl, StlProcessor};
pub use vertex::RawVertex;
