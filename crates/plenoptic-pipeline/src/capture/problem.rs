//! Capture problem type: config, input, state, output and export.

use std::path::PathBuf;

use anyhow::{Result, anyhow, ensure};
use plenoptic_core::{Intrinsics, RenderSettings};
use serde::{Deserialize, Serialize};

use crate::config::{SceneConfig, validate_scene};
use crate::host::{HostCamera, SceneHost};
use crate::metadata::FileNaming;
use crate::render::ReorganizeReport;
use crate::rig::CameraPlacement;
use crate::session::{InvalidationPolicy, ProblemType};

/// What the scene provides to a capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureInput {
    /// Active camera; `None` when the scene has no camera selected.
    pub camera: Option<HostCamera>,
    pub render: RenderSettings,
}

impl CaptureInput {
    pub fn from_host(host: &dyn SceneHost) -> Self {
        Self {
            camera: host.template_camera(),
            render: host.render_settings(),
        }
    }

    pub fn file_naming(&self, config: &SceneConfig) -> FileNaming {
        FileNaming {
            extension: self.render.file_format.extension().to_string(),
            padding: config.frame_padding,
        }
    }
}

/// Intermediate results between capture steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureState {
    /// Generated cameras, in index order.
    pub rig: Vec<CameraPlacement>,
    /// Camera positions are shared by every frame.
    pub layout_static: bool,
    /// Inclusive frame range the rig was sampled for.
    pub frames: Option<(i64, i64)>,
    pub output_dir: Option<PathBuf>,
    /// Host output path before the capture took it over.
    pub initial_output_path: Option<String>,
    pub metadata_written: bool,
    pub rendering: bool,
    /// Informational notes raised by steps.
    pub notes: Vec<String>,
}

impl CaptureState {
    pub fn camera_names(&self) -> Vec<String> {
        self.rig.iter().map(|c| c.name.clone()).collect()
    }

    /// Frame range fixed at preparation. Later config edits do not move it.
    pub fn frame_range(&self) -> Result<(i64, i64)> {
        self.frames
            .ok_or_else(|| anyhow!("scene is not prepared, run step_prepare_scene first"))
    }
}

/// Files written for a capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureOutput {
    pub dataset_dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub intrinsics: Intrinsics,
    pub num_frames: usize,
    pub num_cameras: usize,
    /// Set once a render has been finalized.
    pub images: Option<ReorganizeReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureExport {
    pub dataset_dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub num_frames: usize,
    pub num_cameras: usize,
    pub fl_x: f64,
    pub fl_y: f64,
    pub images_moved: usize,
}

#[derive(Debug)]
pub struct CaptureProblem;

impl ProblemType for CaptureProblem {
    type Config = SceneConfig;
    type Input = CaptureInput;
    type State = CaptureState;
    type Output = CaptureOutput;
    type Export = CaptureExport;

    fn name() -> &'static str {
        "plenoptic_capture"
    }

    fn validate_config(config: &SceneConfig) -> Result<()> {
        ensure!(config.camera_count >= 1, "camera count must be at least 1");
        ensure!(
            config.last_frame >= config.first_frame,
            "last frame {} is before first frame {}",
            config.last_frame,
            config.first_frame
        );
        ensure!(
            config.sphere.radius.is_finite() && config.sphere.radius > 0.0,
            "sphere radius must be positive, got {}",
            config.sphere.radius
        );
        Ok(())
    }

    fn validate_input_config(input: &CaptureInput, config: &SceneConfig) -> Result<()> {
        validate_scene(
            config,
            input.camera.as_ref().map(|c| &c.lens),
            &input.render,
        )?;
        Ok(())
    }

    fn on_config_change() -> InvalidationPolicy {
        InvalidationPolicy::KEEP_ALL
    }

    fn export(output: &CaptureOutput, _config: &SceneConfig) -> Result<CaptureExport> {
        Ok(CaptureExport {
            dataset_dir: output.dataset_dir.clone(),
            files: output.files.clone(),
            num_frames: output.num_frames,
            num_cameras: output.num_cameras,
            fl_x: output.intrinsics.fl_x,
            fl_y: output.intrinsics.fl_y,
            images_moved: output.images.as_ref().map_or(0, |r| r.moved),
        })
    }
}
