//! World-space vertex trajectories across a frame range.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Result, ensure};

use crate::host::SceneHost;
use crate::io::write_json;

/// `object -> vertex index -> frame -> [x, y, z]`.
pub type VertexTracks = BTreeMap<String, BTreeMap<usize, BTreeMap<i64, [f64; 3]>>>;

/// Evaluate every mesh at each frame of `[first, last]` and record the
/// world position of every vertex present at that frame.
pub fn compute_vertex_tracks(host: &dyn SceneHost, first: i64, last: i64) -> Result<VertexTracks> {
    ensure!(last >= first, "empty frame range [{first}, {last}]");
    let mut tracks = VertexTracks::new();
    for frame in first..=last {
        for mesh in host.mesh_instances(frame)? {
            let object = tracks.entry(mesh.name).or_default();
            for (idx, p) in mesh.vertices.iter().enumerate() {
                object.entry(idx).or_default().insert(frame, [p.x, p.y, p.z]);
            }
        }
    }
    log::info!(
        "tracked {} vertices over {} frames",
        tracks.values().map(BTreeMap::len).sum::<usize>(),
        last - first + 1
    );
    Ok(tracks)
}

pub fn write_vertex_tracks(path: &Path, tracks: &VertexTracks) -> Result<()> {
    write_json(path, tracks)
}
