//! In-memory scene host for headless runs and tests.
//!
//! Objects carry local geometry plus keyed world transforms; a key holds
//! until the next one. Rendering is recorded but produces no images.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use plenoptic_core::{GeometrySnapshot, Mat4, RenderSettings, mat4_from_rows};
use serde::{Deserialize, Serialize};

use crate::host::{HostCamera, MeshInstance, SceneHost, SphereObject};
use crate::io::read_ply;
use crate::rig::CameraPlacement;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformKey {
    pub frame: i64,
    /// Row-major object-to-world matrix.
    pub matrix: [[f64; 4]; 4],
}

/// A mesh object of a standalone scene.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneObject {
    pub name: String,
    /// Local-space geometry. Ignored when `ply` is set.
    pub geometry: GeometrySnapshot,
    /// ASCII PLY file with the local geometry, relative to the scene file.
    pub ply: Option<PathBuf>,
    /// Sorted by frame. No keys means identity.
    pub keys: Vec<TransformKey>,
    pub hide_render: bool,
}

impl SceneObject {
    pub fn world_transform(&self, frame: i64) -> Mat4 {
        let idx = self.keys.partition_point(|k| k.frame <= frame);
        let key = if idx == 0 {
            self.keys.first()
        } else {
            self.keys.get(idx - 1)
        };
        key.map_or_else(Mat4::identity, |k| mat4_from_rows(&k.matrix))
    }
}

/// Scene description loaded from JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StandaloneScene {
    pub camera: Option<HostCamera>,
    pub render: RenderSettings,
    pub objects: Vec<SceneObject>,
    pub output_path: String,
}

/// A recorded render request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub output_dir: PathBuf,
    pub first: i64,
    pub last: i64,
}

#[derive(Debug, Clone, Default)]
pub struct StandaloneHost {
    scene: StandaloneScene,
    cameras: Vec<CameraPlacement>,
    active: Option<String>,
    sphere: Option<SphereObject>,
    output_path: String,
    renders: Vec<RenderRequest>,
}

impl StandaloneHost {
    pub fn new(mut scene: StandaloneScene) -> Self {
        for object in &mut scene.objects {
            object.keys.sort_by_key(|k| k.frame);
        }
        let output_path = scene.output_path.clone();
        Self {
            scene,
            output_path,
            ..Self::default()
        }
    }

    /// Load a scene JSON file, resolving PLY references next to it.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let mut scene: StandaloneScene = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        for object in &mut scene.objects {
            if let Some(ply) = &object.ply {
                let ply_path = base.join(ply);
                object.geometry = read_ply(&ply_path)
                    .with_context(|| format!("object '{}'", object.name))?;
            }
        }
        log::debug!(
            "loaded scene {} with {} objects",
            path.display(),
            scene.objects.len()
        );
        Ok(Self::new(scene))
    }

    pub fn scene(&self) -> &StandaloneScene {
        &self.scene
    }

    pub fn generated_cameras(&self) -> &[CameraPlacement] {
        &self.cameras
    }

    pub fn render_requests(&self) -> &[RenderRequest] {
        &self.renders
    }
}

impl SceneHost for StandaloneHost {
    fn template_camera(&self) -> Option<HostCamera> {
        self.scene.camera.clone()
    }

    fn render_settings(&self) -> RenderSettings {
        self.scene.render.clone()
    }

    fn instantiate_cameras(&mut self, placements: &[CameraPlacement]) -> Result<()> {
        for placement in placements {
            if self.cameras.iter().any(|c| c.name == placement.name) {
                bail!("camera '{}' already exists", placement.name);
            }
        }
        self.cameras.extend_from_slice(placements);
        Ok(())
    }

    fn remove_cameras(&mut self, names: &[String]) -> Result<()> {
        let before = self.cameras.len();
        self.cameras.retain(|c| !names.contains(&c.name));
        log::debug!("removed {} cameras", before - self.cameras.len());
        Ok(())
    }

    fn camera_world_transform(&self, name: &str, frame: i64) -> Option<Mat4> {
        self.cameras
            .iter()
            .find(|c| c.name == name)
            .and_then(|c| c.world_transform(frame))
    }

    fn active_object(&self) -> Option<String> {
        self.active.clone()
    }

    fn first_object(&self) -> Option<String> {
        self.scene.objects.first().map(|o| o.name.clone())
    }

    fn set_active_object(&mut self, name: &str) -> Result<()> {
        if !self.scene.objects.iter().any(|o| o.name == name) {
            bail!("no object named '{name}'");
        }
        self.active = Some(name.to_string());
        Ok(())
    }

    fn geometry_snapshot(&self, frame: i64) -> Result<GeometrySnapshot> {
        let mut merged = GeometrySnapshot::default();
        for object in self.scene.objects.iter().filter(|o| !o.hide_render) {
            object
                .geometry
                .validate()
                .with_context(|| format!("object '{}'", object.name))?;
            merged.append(&object.geometry.transformed(&object.world_transform(frame)));
        }
        Ok(merged)
    }

    fn mesh_instances(&self, frame: i64) -> Result<Vec<MeshInstance>> {
        Ok(self
            .scene
            .objects
            .iter()
            .map(|object| {
                let world = object.world_transform(frame);
                MeshInstance {
                    name: object.name.clone(),
                    vertices: object
                        .geometry
                        .positions
                        .iter()
                        .map(|p| world.transform_point(p))
                        .collect(),
                }
            })
            .collect())
    }

    fn sphere_object(&self) -> Option<SphereObject> {
        self.sphere.clone()
    }

    fn set_sphere_object(&mut self, sphere: Option<SphereObject>) {
        self.sphere = sphere;
    }

    fn start_render(&mut self, output_dir: &Path, first: i64, last: i64) -> Result<()> {
        if last < first {
            bail!("cannot render empty frame range [{first}, {last}]");
        }
        log::info!(
            "render requested for frames {first}..={last} into {}",
            output_dir.display()
        );
        self.renders.push(RenderRequest {
            output_dir: output_dir.to_path_buf(),
            first,
            last,
        });
        Ok(())
    }

    fn output_path(&self) -> String {
        self.output_path.clone()
    }

    fn set_output_path(&mut self, path: &str) {
        self.output_path = path.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plenoptic_core::{Pt3, mat4_rows};

    fn triangle(name: &str) -> SceneObject {
        SceneObject {
            name: name.to_string(),
            geometry: GeometrySnapshot {
                positions: vec![
                    Pt3::new(0.0, 0.0, 0.0),
                    Pt3::new(1.0, 0.0, 0.0),
                    Pt3::new(0.0, 1.0, 0.0),
                ],
                faces: vec![vec![0, 1, 2]],
                ..GeometrySnapshot::default()
            },
            ..SceneObject::default()
        }
    }

    #[test]
    fn keys_hold_until_the_next_one() {
        let mut obj = triangle("tri");
        let up = mat4_rows(&Mat4::new_translation(&[0.0, 0.0, 1.0].into()));
        obj.keys = vec![TransformKey {
            frame: 3,
            matrix: up,
        }];
        let host = StandaloneHost::new(StandaloneScene {
            objects: vec![obj],
            ..StandaloneScene::default()
        });
        let at = |frame| host.mesh_instances(frame).unwrap()[0].vertices[1];
        assert_eq!(at(1), Pt3::new(1.0, 0.0, 1.0));
        assert_eq!(at(3), Pt3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn snapshot_skips_hidden_objects() {
        let mut hidden = triangle("hidden");
        hidden.hide_render = true;
        let host = StandaloneHost::new(StandaloneScene {
            objects: vec![triangle("a"), hidden, triangle("b")],
            ..StandaloneScene::default()
        });
        let snapshot = host.geometry_snapshot(1).unwrap();
        assert_eq!(snapshot.num_vertices(), 6);
        assert_eq!(snapshot.faces[1], vec![3, 4, 5]);
        assert_eq!(host.mesh_instances(1).unwrap().len(), 3);
    }

    #[test]
    fn active_object_must_exist() {
        let mut host = StandaloneHost::new(StandaloneScene {
            objects: vec![triangle("a")],
            ..StandaloneScene::default()
        });
        assert_eq!(host.active_object(), None);
        assert_eq!(host.first_object().as_deref(), Some("a"));
        assert!(host.set_active_object("missing").is_err());
        host.set_active_object("a").unwrap();
        assert_eq!(host.active_object().as_deref(), Some("a"));
    }

    #[test]
    fn scene_file_resolves_ply_paths() -> Result<()> {
        let dir = tempfile::tempdir()?;
        crate::io::write_ply(&dir.path().join("tri.ply"), &triangle("x").geometry)?;
        let scene_path = dir.path().join("scene.json");
        fs::write(
            &scene_path,
            r#"{
                "camera": {"name": "Camera", "lens": {
                    "projection": "perspective", "lens_mm": 50.0, "sensor_fit": "auto",
                    "sensor_width_mm": 36.0, "sensor_height_mm": 24.0,
                    "angle_x": 0.69, "angle_y": 0.47}},
                "objects": [{"name": "tri", "ply": "tri.ply"}]
            }"#,
        )?;
        let host = StandaloneHost::from_file(&scene_path)?;
        assert_eq!(host.template_camera().map(|c| c.name).as_deref(), Some("Camera"));
        assert_eq!(host.geometry_snapshot(1)?.num_vertices(), 3);
        assert_eq!(host.render_settings(), RenderSettings::default());
        Ok(())
    }
}
