//! Capture session, metadata assembly and dataset post-processing.
//!
//! ## Session API
//!
//! A capture is driven through a [`DatasetSession`] over any [`SceneHost`]:
//!
//! ```no_run
//! use plenoptic_pipeline::capture::{CaptureProblem, run_capture, step_finalize_render};
//! use plenoptic_pipeline::render::RenderOutcome;
//! use plenoptic_pipeline::session::DatasetSession;
//! use plenoptic_pipeline::standalone::StandaloneHost;
//! # fn main() -> anyhow::Result<()> {
//! let mut host = StandaloneHost::from_file("scene.json".as_ref())?;
//! let mut session = DatasetSession::<CaptureProblem>::new();
//! session.update_config(|c| {
//!     c.save_path = "datasets".into();
//!     c.camera_count = 16;
//! })?;
//!
//! run_capture(&mut session, &mut host)?;
//! step_finalize_render(&mut session, &mut host, RenderOutcome::Completed)?;
//!
//! let export = session.export()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Post-processing
//!
//! Dataset folders can be split into train/test metadata with
//! [`split::split_dataset_dir`] and given a dense initial point cloud with
//! [`resample::resample_dataset_dir`].

// Core session framework
pub mod session;

// Capture workflow
pub mod capture;
pub mod config;
pub mod host;
pub mod render;
pub mod rig;
pub mod runlog;
pub mod sphere_link;
pub mod standalone;

// Dataset files
pub mod extrinsics;
pub mod io;
pub mod metadata;
pub mod transforms;

// Post-processing
pub mod resample;
pub mod split;
pub mod tracks;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports
// ─────────────────────────────────────────────────────────────────────────────

pub use crate::session::{
    DatasetSession, ExportRecord, InvalidationPolicy, LogEntry, ProblemType, SessionMetadata,
};

pub use crate::capture::{
    CaptureExport, CaptureInput, CaptureOutput, CaptureProblem, CaptureState, MetadataOptions,
    PrepareOptions, run_capture, step_finalize_render, step_prepare_scene, step_reset,
    step_start_render, step_write_metadata,
};

pub use crate::config::{ConfigError, SceneConfig, validate_scene};
pub use crate::extrinsics::{
    ExtrinsicsConvention, ExtrinsicsError, ExtrinsicsGrid, FrameLayout, compute_extrinsics,
};
pub use crate::host::{HostCamera, MeshInstance, SceneHost, SphereObject};
pub use crate::metadata::{DatasetMetadata, FileNaming, MetaJson, MetadataError};
pub use crate::render::{RenderOutcome, ReorganizeReport, reorganize_images};
pub use crate::resample::{DenseCloud, ResampleError, resample_dataset_dir, resample_point_cloud};
pub use crate::rig::{CameraPlacement, build_placements, look_at};
pub use crate::runlog::RunLog;
pub use crate::sphere_link::{SphereLink, SpherePanel};
pub use crate::split::{SplitError, split_dataset_dir, split_train_test};
pub use crate::standalone::{StandaloneHost, StandaloneScene};
pub use crate::tracks::{VertexTracks, compute_vertex_tracks, write_vertex_tracks};
pub use crate::transforms::{IntrinsicsSchema, TransformsFormat, TransformsJson};
