//! Step functions for dataset capture.
//!
//! These operate on `DatasetSession<CaptureProblem>` and a [`SceneHost`].
//!
//! # Example
//!
//! ```no_run
//! use plenoptic_pipeline::capture::{
//!     CaptureProblem, step_finalize_render, step_prepare_scene, step_start_render,
//!     step_write_metadata,
//! };
//! use plenoptic_pipeline::render::RenderOutcome;
//! use plenoptic_pipeline::session::DatasetSession;
//! use plenoptic_pipeline::standalone::StandaloneHost;
//! # fn main() -> anyhow::Result<()> {
//! let mut host = StandaloneHost::from_file("scene.json".as_ref())?;
//! let mut session = DatasetSession::<CaptureProblem>::new();
//! session.update_config(|c| c.save_path = "datasets".into())?;
//!
//! step_prepare_scene(&mut session, &mut host, None)?;
//! step_write_metadata(&mut session, &mut host, None)?;
//! step_start_render(&mut session, &mut host)?;
//! // ... renderer runs ...
//! step_finalize_render(&mut session, &mut host, RenderOutcome::Completed)?;
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail, ensure};
use plenoptic_core::{Convention, Mat4, compute_intrinsics};

use crate::config::validate_scene;
use crate::extrinsics::{ExtrinsicsConvention, ExtrinsicsGrid};
use crate::host::SceneHost;
use crate::io::{write_json, write_ply};
use crate::metadata::DatasetMetadata;
use crate::render::{RenderOutcome, ReorganizeReport, reorganize_images};
use crate::resample::GEOMETRY_FILE;
use crate::rig::{CameraPlacement, build_placements};
use crate::runlog::{RUN_LOG_FILE, RunLog};
use crate::session::DatasetSession;
use crate::split::META_FILE;
use crate::transforms::{TRANSFORMS_FILE, TransformsJson};

use super::problem::{CaptureInput, CaptureOutput, CaptureProblem};

const NO_ACTIVE_OBJECT: &str = "No object active. Setting first object as active.";

// ─────────────────────────────────────────────────────────────────────────────
// Step Options
// ─────────────────────────────────────────────────────────────────────────────

/// Options for scene preparation.
#[derive(Debug, Clone, Default)]
pub struct PrepareOptions {
    /// Override the sampling seed.
    pub seed: Option<i64>,
    /// Name prefix for generated cameras. Defaults to the template camera's.
    pub camera_prefix: Option<String>,
}

/// Options for metadata writing.
#[derive(Debug, Clone, Default)]
pub struct MetadataOptions {
    /// Override the axis convention of `meta.json`.
    pub meta_convention: Option<Convention>,
    /// Skip `points3d.ply` even when splat export is enabled.
    pub skip_geometry: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Helper Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Host camera-to-world transforms of the rig, one row per frame.
fn resolve_camera_transforms(
    host: &dyn SceneHost,
    rig: &[CameraPlacement],
    frame_range: (i64, i64),
    layout_static: bool,
) -> Result<ExtrinsicsGrid> {
    let (first, last) = frame_range;
    let resolve = |frame: i64| -> Result<Vec<Mat4>> {
        rig.iter()
            .map(|camera| {
                host.camera_world_transform(&camera.name, frame)
                    .ok_or_else(|| {
                        anyhow!("camera '{}' not found in scene at frame {frame}", camera.name)
                    })
            })
            .collect()
    };

    if layout_static {
        let num_frames = (last - first + 1) as usize;
        return Ok(ExtrinsicsGrid::from_static(resolve(first)?, num_frames));
    }
    let frames = (first..=last).map(resolve).collect::<Result<Vec<_>>>()?;
    Ok(ExtrinsicsGrid::from_frames(frames)?)
}

/// Host output path pointing into the dataset folder.
fn render_output_path(dir: &Path) -> String {
    format!("{}{}", dir.display(), std::path::MAIN_SEPARATOR)
}

// ─────────────────────────────────────────────────────────────────────────────
// Step Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Generate the camera rig and the dataset folder.
///
/// Reads the template camera and render settings from `host`, validates
/// them against the config, samples the camera layout and instantiates one
/// camera per sample point. Writes `log.txt` when enabled.
///
/// # Errors
///
/// - Cameras from a previous run are still present (call [`step_reset`])
/// - Scene or config validation fails
/// - Sampling or camera creation fails
pub fn step_prepare_scene(
    session: &mut DatasetSession<CaptureProblem>,
    host: &mut dyn SceneHost,
    opts: Option<PrepareOptions>,
) -> Result<()> {
    ensure!(
        session.state.rig.is_empty(),
        "{} cameras from a previous run are still in the scene; reset first",
        session.state.rig.len()
    );
    let opts = opts.unwrap_or_default();

    let input = CaptureInput::from_host(&*host);
    validate_scene(
        &session.config,
        input.camera.as_ref().map(|c| &c.lens),
        &input.render,
    )?;
    session.set_input(input)?;
    session.validate()?;

    let input = session.require_input()?.clone();
    let config = session.config.clone();
    let template = input
        .camera
        .as_ref()
        .ok_or_else(|| anyhow!("Be sure to have a selected camera!"))?;

    let mut request = config.placement_request();
    if let Some(seed) = opts.seed {
        request.seed = seed;
    }
    let layout = request.sample()?;
    let prefix = opts.camera_prefix.as_deref().unwrap_or(&template.name);
    let rig = build_placements(prefix, &layout, &request);
    log::debug!(
        "sampled {} cameras with {} repetition(s)",
        layout.num_cameras(),
        layout.num_repetitions()
    );

    let output_dir = config.output_dir();
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    if config.write_log {
        RunLog::new(&config, template.lens.lens_mm).write(&output_dir)?;
        log::debug!("wrote {}", output_dir.join(RUN_LOG_FILE).display());
    }

    // Last fallible call: the session must record every camera the host holds.
    host.instantiate_cameras(&rig)
        .context("failed to create cameras")?;

    let notes = format!(
        "{} cameras, {} frames, static={}",
        rig.len(),
        request.frame_count(),
        layout.is_static()
    );
    session.state.initial_output_path = Some(host.output_path());
    session.state.layout_static = layout.is_static();
    session.state.frames = Some(request.frame_range);
    session.state.output_dir = Some(output_dir);
    session.state.rig = rig;
    session.state.metadata_written = false;
    session.state.rendering = false;

    log::info!("prepared scene: {notes}");
    session.log_success_with_notes("prepare_scene", notes);
    Ok(())
}

/// Write `meta.json`, `transforms.json` and optionally `points3d.ply`.
///
/// Both JSON documents are built before anything is written.
///
/// # Errors
///
/// - Scene not prepared
/// - A generated camera is missing from the host
/// - Intrinsics or extrinsics cannot be computed
pub fn step_write_metadata(
    session: &mut DatasetSession<CaptureProblem>,
    host: &mut dyn SceneHost,
    opts: Option<MetadataOptions>,
) -> Result<()> {
    session.validate()?;
    ensure!(
        !session.state.rig.is_empty(),
        "scene is not prepared, run step_prepare_scene first"
    );
    let opts = opts.unwrap_or_default();

    let input = session.require_input()?.clone();
    let config = session.config.clone();
    let lens = &input
        .camera
        .as_ref()
        .ok_or_else(|| anyhow!("Be sure to have a selected camera!"))?
        .lens;
    let output_dir = session
        .state
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir());
    let frame_range = session.state.frame_range()?;
    if frame_range != (config.first_frame, config.last_frame) {
        log::warn!(
            "frame range changed since the scene was prepared; writing the prepared range {}..={}",
            frame_range.0,
            frame_range.1
        );
    }

    let intrinsics = compute_intrinsics(&input.render, lens)?;
    let c2w = resolve_camera_transforms(
        &*host,
        &session.state.rig,
        frame_range,
        session.state.layout_static,
    )?;
    let camera_names = session.state.camera_names();

    let naming = input.file_naming(&config);
    let metadata = DatasetMetadata::assemble(intrinsics.clone(), c2w, &naming)?;
    let axes = opts.meta_convention.unwrap_or(config.meta_convention);
    let meta = metadata.to_meta_json(ExtrinsicsConvention::WorldToCamera { axes })?;
    let transforms = TransformsJson::build(
        &intrinsics,
        config.transforms_format,
        &metadata.extrinsics,
        &camera_names,
        &metadata.file_names,
        frame_range.0,
    );

    fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let meta_path = output_dir.join(META_FILE);
    let transforms_path = output_dir.join(TRANSFORMS_FILE);
    write_json(&meta_path, &meta)?;
    write_json(&transforms_path, &transforms)?;
    let mut files = vec![meta_path, transforms_path];
    if config.write_log {
        files.push(output_dir.join(RUN_LOG_FILE));
    }

    if config.export_splats && !opts.skip_geometry {
        if host.active_object().is_none() {
            log::info!("{NO_ACTIVE_OBJECT}");
            session.state.notes.push(NO_ACTIVE_OBJECT.to_string());
            if let Some(first) = host.first_object() {
                host.set_active_object(&first)?;
            }
        }
        let snapshot = host
            .geometry_snapshot(frame_range.0)
            .context("failed to snapshot scene geometry")?;
        let ply_path = output_dir.join(GEOMETRY_FILE);
        write_ply(&ply_path, &snapshot)?;
        log::debug!(
            "wrote {} vertices to {}",
            snapshot.num_vertices(),
            ply_path.display()
        );
        files.push(ply_path);
    }

    let notes = format!(
        "{} frames x {} cameras, fl_x={:.3}",
        metadata.num_frames(),
        metadata.num_cameras(),
        intrinsics.fl_x
    );
    session.set_output(CaptureOutput {
        dataset_dir: output_dir,
        files,
        num_frames: metadata.num_frames(),
        num_cameras: metadata.num_cameras(),
        intrinsics,
        images: None,
    });
    session.state.metadata_written = true;

    log::info!("wrote metadata: {notes}");
    session.log_success_with_notes("write_metadata", notes);
    Ok(())
}

/// Point the host output at the dataset folder and start rendering.
///
/// # Errors
///
/// - Metadata not written
/// - A render is already in progress
/// - The host refuses the render
pub fn step_start_render(
    session: &mut DatasetSession<CaptureProblem>,
    host: &mut dyn SceneHost,
) -> Result<()> {
    ensure!(
        session.state.metadata_written,
        "metadata not written, run step_write_metadata first"
    );
    if session.state.rendering {
        bail!("a render is already in progress");
    }
    let output_dir = session
        .state
        .output_dir
        .clone()
        .ok_or_else(|| anyhow!("scene is not prepared, run step_prepare_scene first"))?;
    let (first, last) = session.state.frame_range()?;

    host.set_output_path(&render_output_path(&output_dir));
    if let Err(e) = host.start_render(&output_dir, first, last) {
        if let Some(initial) = &session.state.initial_output_path {
            host.set_output_path(initial);
        }
        session.log_failure("start_render", e.to_string());
        return Err(e.context("failed to start render"));
    }
    session.state.rendering = true;

    session.log_success_with_notes("start_render", format!("frames {first}..={last}"));
    Ok(())
}

/// Clean up after a render, whether it completed or was cancelled.
///
/// Restores the host output path, clears the rendering flag and moves the
/// rendered images into `ims/{camera}/`. Returns `None` when no render was
/// in progress.
pub fn step_finalize_render(
    session: &mut DatasetSession<CaptureProblem>,
    host: &mut dyn SceneHost,
    outcome: RenderOutcome,
) -> Result<Option<ReorganizeReport>> {
    if !session.state.rendering {
        log::debug!("finalize_render ({outcome:?}) with no render in progress");
        return Ok(None);
    }
    if let Some(initial) = session.state.initial_output_path.clone() {
        host.set_output_path(&initial);
    }
    session.state.rendering = false;

    let output_dir = session
        .state
        .output_dir
        .clone()
        .ok_or_else(|| anyhow!("render in progress without an output folder"))?;
    let naming = session.require_input()?.file_naming(&session.config);
    let report = reorganize_images(
        &output_dir,
        session.state.rig.len(),
        session.state.frame_range()?,
        &naming,
    )?;

    let notes = format!(
        "{outcome:?}: moved {}, missing {}",
        report.moved,
        report.missing.len()
    );
    if let Some(output) = session.output() {
        let mut output = output.clone();
        output.images = Some(report.clone());
        session.set_output(output);
    }
    session.log_success_with_notes("finalize_render", notes);
    Ok(Some(report))
}

/// Remove generated cameras from the host and clear the capture state.
///
/// Written files are left in place.
pub fn step_reset(
    session: &mut DatasetSession<CaptureProblem>,
    host: &mut dyn SceneHost,
) -> Result<()> {
    let names = session.state.camera_names();
    if !names.is_empty() {
        host.remove_cameras(&names)
            .context("failed to remove generated cameras")?;
    }
    if session.state.rendering {
        if let Some(initial) = &session.state.initial_output_path {
            host.set_output_path(initial);
        }
    }
    session.reset_state();
    session.reset_output();

    log::info!("removed {} generated cameras", names.len());
    session.log_success_with_notes("reset", format!("{} cameras removed", names.len()));
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline Function
// ─────────────────────────────────────────────────────────────────────────────

/// Prepare the scene, write metadata and start the render.
///
/// # Errors
///
/// Any error from the constituent steps.
pub fn run_capture(
    session: &mut DatasetSession<CaptureProblem>,
    host: &mut dyn SceneHost,
) -> Result<()> {
    step_prepare_scene(session, host, None)?;
    step_write_metadata(session, host, None)?;
    step_start_render(session, host)?;
    Ok(())
}
