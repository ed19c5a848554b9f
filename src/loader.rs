use crate::error::{LoadError, LoadWarning};
use crate::indexer;
use crate::mesh::Mesh;
use crate::settings::LoaderSettings;
use crate::stl_processor::StlProcessor;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::thread;

/// A successfully loaded mesh plus any non-fatal diagnostics raised on the
/// way. An empty solid still counts as success; `warnings` carries the
/// milder `EmptyMesh` notice.
#[derive(Debug)]
pub struct LoadedStl {
    pub mesh: Mesh,
    pub warnings: Vec<LoadWarning>,
}

/// Run the whole pipeline synchronously: sniff, parse, deduplicate.
pub fn load_stl(filename: &Path, settings: &LoaderSettings) -> Result<LoadedStl, LoadError> {
    let parsed = StlProcessor::read_stl(filename)?;

    let threads = if settings.parallel_sort && parsed.raw_vertices.len() >= settings.parallel_threshold
    {
        match settings.max_sort_threads {
            0 => indexer::hardware_threads(),
            cap => cap,
        }
    } else {
        1
    };
    let mesh = indexer::build_mesh(parsed.raw_vertices, threads);

    let mut warnings = Vec::new();
    if parsed.confusing {
        warn!(
            "{}: binary STL with a \"solid\" header",
            filename.display()
        );
        warnings.push(LoadWarning::ConfusingStl);
    }
    if mesh.is_empty() {
        warn!("{}: file contains no triangles", filename.display());
        warnings.push(LoadWarning::EmptyMesh);
    }
    debug!(
        "loaded {} ({} triangles, {} unique vertices)",
        filename.display(),
        mesh.triangle_count(),
        mesh.vertex_count()
    );
    Ok(LoadedStl { mesh, warnings })
}

/// Single-shot background loader.
///
/// Runs the pipeline on its own worker thread so a large file does not block
/// the caller; the result comes back over a channel. A load runs to
/// completion or failure, there is no mid-parse cancellation, and callers
/// are expected to keep at most one loader in flight per viewer.
pub struct Loader {
    rx: Receiver<Result<LoadedStl, LoadError>>,
    handle: thread::JoinHandle<()>,
}

impl Loader {
    pub fn spawn(filename: PathBuf, settings: LoaderSettings) -> Self {
        let (tx, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("stl-loader".to_string())
            .spawn(move || {
                let result = load_stl(&filename, &settings);
                // The receiver may be gone if the viewer shut down mid-load.
                let _ = tx.send(result);
            })
            .expect("failed to spawn loader thread");
        Self { rx, handle }
    }

    /// Block until the load completes and take its result. Must not be
    /// called after `try_take` has already delivered the result.
    pub fn wait(self) -> Result<LoadedStl, LoadError> {
        let result = self
            .rx
            .recv()
            .expect("loader thread exited without a result");
        let _ = self.handle.join();
        result
    }

    /// Non-blocking poll; `None` while the load is still running. At most
    /// one result is ever delivered.
    pub fn try_take(&mut self) -> Option<Result<LoadedStl, LoadError>> {
        self.rx.try_recv().ok()
    }
}
