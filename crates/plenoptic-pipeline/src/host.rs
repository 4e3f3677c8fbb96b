//! The scene host collaborator.
//!
//! A host owns the editable scene: the template camera, render settings,
//! mesh objects and the renderer. Capture steps talk to it only through
//! [`SceneHost`].

use std::path::Path;

use anyhow::Result;
use plenoptic_core::{CameraLens, GeometrySnapshot, Mat4, Pt3, RenderSettings, SphereSpec};
use serde::{Deserialize, Serialize};

use crate::rig::CameraPlacement;

/// The active (template) camera of the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostCamera {
    pub name: String,
    pub lens: CameraLens,
}

/// The sampling sphere helper object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SphereObject {
    pub spec: SphereSpec,
    pub hidden: bool,
}

/// World-space vertices of one mesh object at one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshInstance {
    pub name: String,
    pub vertices: Vec<Pt3>,
}

pub trait SceneHost {
    /// Active camera, used as the template for generated cameras.
    fn template_camera(&self) -> Option<HostCamera>;

    fn render_settings(&self) -> RenderSettings;

    /// Create camera objects with keyed locations, tracking constraints and
    /// multiview suffixes.
    fn instantiate_cameras(&mut self, placements: &[CameraPlacement]) -> Result<()>;

    /// Remove previously generated camera objects.
    fn remove_cameras(&mut self, names: &[String]) -> Result<()>;

    /// Evaluated camera-to-world transform of a camera at `frame`.
    fn camera_world_transform(&self, name: &str, frame: i64) -> Option<Mat4>;

    fn active_object(&self) -> Option<String>;

    fn first_object(&self) -> Option<String>;

    fn set_active_object(&mut self, name: &str) -> Result<()>;

    /// Merged world-space geometry of the render-visible meshes at `frame`.
    fn geometry_snapshot(&self, frame: i64) -> Result<GeometrySnapshot>;

    /// World-space vertices of every mesh at `frame`.
    fn mesh_instances(&self, frame: i64) -> Result<Vec<MeshInstance>>;

    fn sphere_object(&self) -> Option<SphereObject>;

    /// Create, update or (with `None`) delete the sphere object.
    fn set_sphere_object(&mut self, sphere: Option<SphereObject>);

    /// Start an animation render of `[first, last]` into `output_dir`.
    fn start_render(&mut self, output_dir: &Path, first: i64, last: i64) -> Result<()>;

    fn output_path(&self) -> String;

    fn set_output_path(&mut self, path: &str);
}
