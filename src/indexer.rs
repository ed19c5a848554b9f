use crate::mesh::Mesh;
use crate::vertex::RawVertex;
use log::debug;
use std::num::NonZeroUsize;
use std::thread;

/// Ranges shorter than this are always sorted sequentially; the split
/// overhead is not worth it below this size.
const MIN_PARALLEL_LEN: usize = 4096;

/// Thread budget used when hardware concurrency cannot be queried.
const FALLBACK_THREADS: usize = 8;

/// Thread budget for the parallel sort, bounded by hardware concurrency.
pub fn hardware_threads() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(FALLBACK_THREADS)
}

/// Build an indexed mesh from the flat corner stream.
///
/// Sorting brings duplicate positions together, so the dedup is a single
/// forward scan that compacts unique vertices toward the front of the buffer
/// while rebuilding the per-corner index array from each corner's original
/// stream position. `threads` is the sort budget; anything below 2 runs the
/// plain sequential sort, and both paths produce identical output.
pub fn build_mesh(mut raw: Vec<RawVertex>, threads: usize) -> Mesh {
    let corner_count = raw.len();
    if threads > 1 {
        debug!(
            "parallel merge sort over {} corners, thread budget {}",
            corner_count, threads
        );
        parallel_sort(&mut raw, threads);
    } else {
        raw.sort_unstable();
    }

    let mut indices = vec![0u32; corner_count];
    let mut unique = 0usize;
    for i in 0..raw.len() {
        if unique == 0 || raw[i] != raw[unique - 1] {
            raw[unique] = raw[i];
            unique += 1;
        }
        indices[raw[i].original_index as usize] = (unique - 1) as u32;
    }
    raw.truncate(unique);

    let mut vertices = Vec::with_capacity(unique * 3);
    for v in &raw {
        vertices.extend_from_slice(&v.position);
    }
    debug!(
        "deduplicated {} corners into {} unique vertices",
        corner_count, unique
    );
    Mesh::new(vertices, indices)
}

/// Recursive fork-join merge sort. The thread budget is halved at each
/// split; once it reaches 1, or the range is small, the half is sorted
/// sequentially. Both halves are joined before the merge, and the merge is
/// deterministic, so the result matches the sequential sort.
fn parallel_sort(data: &mut [RawVertex], threads: usize) {
    if threads <= 1 || data.len() < MIN_PARALLEL_LEN {
        data.sort_unstable();
        return;
    }
    let mid = data.len() / 2;
    let budget = threads / 2;
    {
        let (lo, hi) = data.split_at_mut(mid);
        rayon::join(
            || parallel_sort(lo, budget),
            || parallel_sort(hi, threads - budget),
        );
    }
    merge(data, mid);
}

/// Merge two sorted halves of `data` through an auxiliary buffer.
fn merge(data: &mut [RawVertex], mid: usize) {
    let mut merged = Vec::with_capacity(data.len());
    let (lo, hi) = data.split_at(mid);
    let (mut i, mut j) = (0, 0);
    while i < lo.len() && j < hi.len() {
        if hi[j] < lo[i] {
            merged.push(hi[j]);
            j += 1;
        } else {
            merged.push(lo[i]);
            i += 1;
        }
    }
    merged.extend_from_slice(&lo[i..]);
    merged.extend_from_slice(&hi[j..]);
    data.copy_from_slice(&merged);
}
