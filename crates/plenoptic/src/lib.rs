//! High-level entry crate for plenoptic multi-view dataset generation.
//!
//! Cameras are distributed over a (possibly ellipsoidal) sampling sphere,
//! per-frame intrinsics and extrinsics are written as `meta.json` and
//! `transforms.json`, and finished datasets can be split into train/test
//! sets or given a dense initial point cloud.
//!
//! # Quick Start
//!
//! ```no_run
//! # fn main() -> anyhow::Result<()> {
//! use plenoptic::prelude::*;
//! use plenoptic::capture::{step_prepare_scene, step_write_metadata};
//!
//! let mut host = StandaloneHost::from_file("scene.json".as_ref())?;
//! let mut session = DatasetSession::<CaptureProblem>::new();
//! session.update_config(|c| {
//!     c.save_path = "datasets".into();
//!     c.camera_count = 32;
//!     c.distribution = Distribution::GoldenAngle;
//! })?;
//!
//! step_prepare_scene(&mut session, &mut host, None)?;
//! step_write_metadata(&mut session, &mut host, None)?;
//!
//! let export = session.export()?;
//! println!("{} cameras in {}", export.num_cameras, export.dataset_dir.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`session`] - Session framework (`DatasetSession`, `ProblemType`)
//! - [`capture`] - Camera rig generation, metadata and render cleanup
//! - [`dataset`] - Metadata documents and post-processing of dataset folders
//! - [`host`] - Scene host abstraction and the standalone host
//! - [`core`] - Math, conventions, sampler, camera model and geometry

// ═══════════════════════════════════════════════════════════════════════════════
// Session Framework
// ═══════════════════════════════════════════════════════════════════════════════

/// Session framework: state container, step logging and JSON checkpoints.
pub mod session {
    pub use plenoptic_pipeline::session::{
        DatasetSession, ExportRecord, InvalidationPolicy, LogEntry, ProblemType, SessionMetadata,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Capture
// ═══════════════════════════════════════════════════════════════════════════════

/// Multi-view capture.
///
/// # Steps
/// 1. `step_prepare_scene` - sample the sphere and create cameras
/// 2. `step_write_metadata` - write `meta.json`, `transforms.json`, `points3d.ply`
/// 3. `step_start_render` - hand the frame range to the renderer
/// 4. `step_finalize_render` - sort rendered frames into `ims/`
pub mod capture {
    pub use plenoptic_pipeline::capture::{
        // Problem type
        CaptureExport,
        CaptureInput,
        CaptureOutput,
        CaptureProblem,
        CaptureState,
        // Step options
        MetadataOptions,
        PrepareOptions,
        // Step functions
        run_capture,
        step_finalize_render,
        step_prepare_scene,
        step_reset,
        step_start_render,
        step_write_metadata,
    };
    pub use plenoptic_pipeline::config::{ConfigError, SceneConfig, validate_scene};
    pub use plenoptic_pipeline::render::{RenderOutcome, ReorganizeReport, reorganize_images};
    pub use plenoptic_pipeline::rig::{CameraPlacement, build_placements, look_at};
    pub use plenoptic_pipeline::runlog::RunLog;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Dataset Files
// ═══════════════════════════════════════════════════════════════════════════════

/// Metadata documents, PLY/NPZ io and dataset post-processing.
pub mod dataset {
    pub use plenoptic_pipeline::extrinsics::{
        ExtrinsicsConvention, ExtrinsicsError, ExtrinsicsGrid, compute_extrinsics,
    };
    pub use plenoptic_pipeline::io::{
        Array2, PlyError, convert_ply_to_opencv, read_json, read_npz_array, read_ply, write_json,
        write_npz, write_ply,
    };
    pub use plenoptic_pipeline::metadata::{DatasetMetadata, FileNaming, MetaJson, MetadataError};
    pub use plenoptic_pipeline::resample::{
        DenseCloud, resample_dataset_dir, resample_point_cloud,
    };
    pub use plenoptic_pipeline::split::{SplitError, split_dataset_dir, split_train_test};
    pub use plenoptic_pipeline::tracks::{VertexTracks, compute_vertex_tracks, write_vertex_tracks};
    pub use plenoptic_pipeline::transforms::{IntrinsicsSchema, TransformsFormat, TransformsJson};
}

/// Scene host abstraction.
pub mod host {
    pub use plenoptic_pipeline::host::{HostCamera, MeshInstance, SceneHost, SphereObject};
    pub use plenoptic_pipeline::sphere_link::{SphereLink, SpherePanel};
    pub use plenoptic_pipeline::standalone::{
        SceneObject, StandaloneHost, StandaloneScene, TransformKey,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Foundation
// ═══════════════════════════════════════════════════════════════════════════════

pub mod core {
    pub use plenoptic_core::*;
}

// ═══════════════════════════════════════════════════════════════════════════════
// Root Re-exports
// ═══════════════════════════════════════════════════════════════════════════════

pub use plenoptic_pipeline::{CaptureProblem, DatasetSession, ProblemType, run_capture};

pub use plenoptic_core::{
    CameraLens, Convention, Distribution, GeometrySnapshot, Intrinsics, Mat4, PlacementRequest,
    Pt3, RenderSettings, SphereSpec, Vec3, compute_intrinsics,
};

/// Prelude module for convenient imports.
///
/// ```no_run
/// use plenoptic::prelude::*;
/// ```
pub mod prelude {
    // Session framework
    pub use crate::session::{DatasetSession, ProblemType};

    // Capture
    pub use crate::capture::{CaptureProblem, RenderOutcome, SceneConfig};
    pub use crate::run_capture;

    // Hosts
    pub use crate::host::{SceneHost, StandaloneHost};

    // Core types
    pub use crate::{
        CameraLens, Convention, Distribution, GeometrySnapshot, Intrinsics, Mat4,
        PlacementRequest, Pt3, RenderSettings, SphereSpec, Vec3,
    };
}
