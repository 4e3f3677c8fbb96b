//! Scene configuration and pre-flight validation.

use std::path::{Path, PathBuf};

use plenoptic_core::{
    CameraLens, Convention, Distribution, ImageFormat, PlacementRequest, ProjectionKind,
    RenderSettings, SphereSpec,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transforms::TransformsFormat;

/// User-facing settings of a capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub dataset_name: String,
    /// Parent directory of the dataset folder.
    pub save_path: String,
    pub seed: i64,
    pub camera_count: usize,
    pub first_frame: i64,
    /// Inclusive.
    pub last_frame: i64,
    pub sphere: SphereSpec,
    /// Restrict cameras to the upper hemisphere.
    pub hemisphere_only: bool,
    /// Cameras look away from the sphere center.
    pub outward: bool,
    pub distribution: Distribution,
    pub transforms_format: TransformsFormat,
    /// Axis convention of the `w2c` matrices in `meta.json`.
    pub meta_convention: Convention,
    /// Export `points3d.ply` for Gaussian Splatting initialisation.
    pub export_splats: bool,
    pub write_log: bool,
    /// Zero padding of frame indices in image file names.
    pub frame_padding: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            dataset_name: "dataset".to_string(),
            save_path: String::new(),
            seed: 0,
            camera_count: 100,
            first_frame: 1,
            last_frame: 10,
            sphere: SphereSpec::default(),
            hemisphere_only: false,
            outward: false,
            distribution: Distribution::default(),
            transforms_format: TransformsFormat::default(),
            meta_convention: Convention::OpenCv,
            export_splats: false,
            write_log: false,
            frame_padding: 6,
        }
    }
}

impl SceneConfig {
    pub fn frame_count(&self) -> usize {
        if self.last_frame < self.first_frame {
            0
        } else {
            (self.last_frame - self.first_frame + 1) as usize
        }
    }

    /// Dataset folder: `save_path/clean_name(dataset_name)`.
    pub fn output_dir(&self) -> PathBuf {
        Path::new(&self.save_path).join(clean_name(&self.dataset_name))
    }

    pub fn placement_request(&self) -> PlacementRequest {
        PlacementRequest {
            seed: self.seed,
            camera_count: self.camera_count,
            hemisphere_only: self.hemisphere_only,
            outward: self.outward,
            distribution: self.distribution,
            frame_range: (self.first_frame, self.last_frame),
            sphere: self.sphere.clone(),
        }
    }
}

/// Reasons a capture cannot start. Only the first failing check is reported.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Be sure to have a selected camera!")]
    MissingCamera,
    #[error("Only perspective cameras are supported!")]
    NotPerspective,
    #[error("Dataset name cannot be empty!")]
    EmptyDatasetName,
    #[error("The sampling sphere cannot be flat! Change its scale to be non-zero in all axes.")]
    FlatSphere,
    #[error("AABB scale needs to be a power of two!")]
    AabbNotPowerOfTwo,
    #[error("Save path cannot be empty!")]
    EmptySavePath,
    #[error("Gaussian Splatting requires PNG file extensions!")]
    SplatsRequirePng,
}

/// Run the pre-flight checks in order and return the first failure.
pub fn validate_scene(
    config: &SceneConfig,
    camera: Option<&CameraLens>,
    render: &RenderSettings,
) -> Result<(), ConfigError> {
    let camera = camera.ok_or(ConfigError::MissingCamera)?;
    if camera.projection != ProjectionKind::Perspective {
        return Err(ConfigError::NotPerspective);
    }
    if config.dataset_name.is_empty() {
        return Err(ConfigError::EmptyDatasetName);
    }
    if config.sphere.is_flat() {
        return Err(ConfigError::FlatSphere);
    }
    if let Some(aabb) = config.transforms_format.aabb_scale() {
        if !is_power_of_two(aabb) {
            return Err(ConfigError::AabbNotPowerOfTwo);
        }
    }
    if config.save_path.is_empty() {
        return Err(ConfigError::EmptySavePath);
    }
    if config.export_splats && render.file_format != ImageFormat::Png {
        return Err(ConfigError::SplatsRequirePng);
    }
    Ok(())
}

pub fn is_power_of_two(x: u32) -> bool {
    x.is_power_of_two()
}

/// Replace every character that is not an ASCII letter or digit with `_`.
pub fn clean_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use plenoptic_core::Vec3;

    fn ready() -> SceneConfig {
        SceneConfig {
            save_path: "/tmp/out".into(),
            ..SceneConfig::default()
        }
    }

    #[test]
    fn defaults_match_the_panel() {
        let c = SceneConfig::default();
        assert_eq!(c.dataset_name, "dataset");
        assert_eq!(c.camera_count, 100);
        assert_eq!(c.sphere.radius, 4.0);
        assert_eq!(c.transforms_format, TransformsFormat::Ngp { aabb_scale: 4 });
        assert_eq!(c.frame_count(), 10);
    }

    #[test]
    fn missing_camera_is_reported_first() {
        let config = SceneConfig {
            dataset_name: String::new(),
            save_path: String::new(),
            ..SceneConfig::default()
        };
        let err = validate_scene(&config, None, &RenderSettings::default()).unwrap_err();
        assert_eq!(err.to_string(), "Be sure to have a selected camera!");
    }

    #[test]
    fn checks_run_in_order() {
        let lens = CameraLens::default();
        let render = RenderSettings::default();

        let mut ortho = lens.clone();
        ortho.projection = ProjectionKind::Orthographic;
        assert_eq!(
            validate_scene(&ready(), Some(&ortho), &render),
            Err(ConfigError::NotPerspective)
        );

        let mut c = ready();
        c.dataset_name.clear();
        c.sphere.scale = Vec3::new(1.0, 0.0, 1.0);
        assert_eq!(
            validate_scene(&c, Some(&lens), &render),
            Err(ConfigError::EmptyDatasetName)
        );

        c.dataset_name = "scene".into();
        c.transforms_format = TransformsFormat::Ngp { aabb_scale: 3 };
        assert_eq!(
            validate_scene(&c, Some(&lens), &render),
            Err(ConfigError::FlatSphere)
        );

        c.sphere.scale = Vec3::new(1.0, 1.0, 1.0);
        c.save_path.clear();
        assert_eq!(
            validate_scene(&c, Some(&lens), &render),
            Err(ConfigError::AabbNotPowerOfTwo)
        );

        // AABB is irrelevant for the NeRF format.
        c.transforms_format = TransformsFormat::Nerf;
        assert_eq!(
            validate_scene(&c, Some(&lens), &render),
            Err(ConfigError::EmptySavePath)
        );

        c.save_path = "/tmp".into();
        c.export_splats = true;
        let jpeg = RenderSettings {
            file_format: ImageFormat::Jpeg,
            ..RenderSettings::default()
        };
        assert_eq!(
            validate_scene(&c, Some(&lens), &jpeg),
            Err(ConfigError::SplatsRequirePng)
        );
        assert_eq!(validate_scene(&c, Some(&lens), &render), Ok(()));
    }

    #[test]
    fn clean_name_replaces_non_alphanumerics() {
        assert_eq!(clean_name("my scene/v2.1"), "my_scene_v2_1");
        assert_eq!(clean_name("dataset"), "dataset");
        assert_eq!(clean_name("é"), "_");
    }

    #[test]
    fn power_of_two() {
        assert!([1, 2, 4, 128].into_iter().all(is_power_of_two));
        assert!(![0, 3, 6, 100].into_iter().any(is_power_of_two));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let c: SceneConfig = serde_json::from_str(
            r#"{"dataset_name": "lego", "save_path": "out", "distribution": {"type": "golden_angle"}}"#,
        )
        .unwrap();
        assert_eq!(c.dataset_name, "lego");
        assert_eq!(c.distribution, Distribution::GoldenAngle);
        assert_eq!(c.camera_count, 100);
        assert_eq!(c.output_dir(), Path::new("out").join("lego"));
    }
}
