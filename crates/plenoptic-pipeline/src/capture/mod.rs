//! Multi-view capture: camera rig generation, metadata and render cleanup.
//!
//! [`CaptureProblem`] drives a [`SceneHost`](crate::host::SceneHost)
//! through a [`DatasetSession`](crate::session::DatasetSession):
//!
//! 1. [`step_prepare_scene`] samples the sphere and creates the cameras.
//! 2. [`step_write_metadata`] writes `meta.json`, `transforms.json` and
//!    optionally `points3d.ply`.
//! 3. [`step_start_render`] hands the frame range to the renderer.
//! 4. [`step_finalize_render`] sorts rendered frames into `ims/`.
//!
//! [`step_reset`] removes the generated cameras again.

mod problem;
mod steps;

pub use problem::{CaptureExport, CaptureInput, CaptureOutput, CaptureProblem, CaptureState};
pub use steps::{
    MetadataOptions, PrepareOptions, run_capture, step_finalize_render, step_prepare_scene,
    step_reset, step_start_render, step_write_metadata,
};
