//! `log.txt`: a human-readable record of the settings used for a run.

use std::path::Path;

use anyhow::Result;
use plenoptic_core::{Real, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::SceneConfig;
use crate::io::write_json;

pub const RUN_LOG_FILE: &str = "log.txt";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLog {
    #[serde(rename = "PlenoBlenderNeRF Version")]
    pub version: String,
    #[serde(rename = "Date and Time")]
    pub date_time: String,
    #[serde(rename = "AABB")]
    pub aabb: Option<u32>,
    #[serde(rename = "File Format")]
    pub file_format: String,
    #[serde(rename = "Save Path")]
    pub save_path: String,
    #[serde(rename = "Sphere Location")]
    pub sphere_location: String,
    #[serde(rename = "Sphere Rotation")]
    pub sphere_rotation: String,
    #[serde(rename = "Sphere Scale")]
    pub sphere_scale: String,
    #[serde(rename = "Sphere Radius")]
    pub sphere_radius: Real,
    #[serde(rename = "Lens")]
    pub lens: String,
    #[serde(rename = "Seed")]
    pub seed: i64,
    #[serde(rename = "Number of Frames")]
    pub frame_count: usize,
    #[serde(rename = "Number of Cameras")]
    pub camera_count: usize,
    #[serde(rename = "Upper Views")]
    pub upper_views: bool,
    #[serde(rename = "Outwards")]
    pub outwards: bool,
    #[serde(rename = "Dataset Name")]
    pub dataset_name: String,
}

/// Float text with a trailing `.0` on integral values, e.g. `50.0`.
fn float_text(v: Real) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

fn list_text(v: &Vec3) -> String {
    format!(
        "[{}, {}, {}]",
        float_text(v.x),
        float_text(v.y),
        float_text(v.z)
    )
}

impl RunLog {
    /// Describe `config` with the current local time.
    pub fn new(config: &SceneConfig, lens_mm: Real) -> Self {
        let date_time = chrono::Local::now().format("%d/%m/%Y %H:%M:%S").to_string();
        Self::with_timestamp(config, lens_mm, date_time)
    }

    pub fn with_timestamp(config: &SceneConfig, lens_mm: Real, date_time: String) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            date_time,
            aabb: config.transforms_format.aabb_scale(),
            file_format: config.transforms_format.label().to_string(),
            save_path: config.save_path.clone(),
            sphere_location: list_text(&config.sphere.center),
            sphere_rotation: list_text(&config.sphere.rotation),
            sphere_scale: list_text(&config.sphere.scale),
            sphere_radius: config.sphere.radius,
            lens: format!("{} mm", float_text(lens_mm)),
            seed: config.seed,
            frame_count: config.frame_count(),
            camera_count: config.camera_count,
            upper_views: config.hemisphere_only,
            outwards: config.outward,
            dataset_name: config.dataset_name.clone(),
        }
    }

    pub fn write(&self, dir: &Path) -> Result<()> {
        write_json(&dir.join(RUN_LOG_FILE), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::to_json_string;
    use crate::transforms::TransformsFormat;

    #[test]
    fn keys_and_values_follow_the_log_layout() {
        let mut config = SceneConfig {
            save_path: "/data".into(),
            seed: 3,
            ..SceneConfig::default()
        };
        config.sphere.center = Vec3::new(0.0, 1.5, -2.0);
        let log = RunLog::with_timestamp(&config, 50.0, "01/02/2026 10:20:30".into());
        let text = to_json_string(&log).unwrap();

        let keys: Vec<&str> = text
            .lines()
            .filter_map(|l| l.trim().strip_prefix('"'))
            .filter_map(|l| l.split('"').next())
            .collect();
        assert_eq!(keys[0], "PlenoBlenderNeRF Version");
        assert_eq!(keys[1], "Date and Time");
        assert_eq!(keys.last(), Some(&"Dataset Name"));
        assert_eq!(keys.len(), 16);

        assert!(text.contains("\"AABB\": 4"));
        assert!(text.contains("\"File Format\": \"NGP\""));
        assert!(text.contains("\"Sphere Location\": \"[0.0, 1.5, -2.0]\""));
        assert!(text.contains("\"Sphere Radius\": 4,"));
        assert!(text.contains("\"Lens\": \"50.0 mm\""));
        assert!(text.contains("\"Number of Frames\": 10"));
    }

    #[test]
    fn nerf_format_has_no_aabb() {
        let config = SceneConfig {
            transforms_format: TransformsFormat::Nerf,
            ..SceneConfig::default()
        };
        let log = RunLog::new(&config, 35.5);
        assert_eq!(log.aabb, None);
        assert_eq!(log.file_format, "NeRF");
        assert_eq!(log.lens, "35.5 mm");
        assert_eq!(log.date_time.len(), "dd/mm/yyyy hh:mm:ss".len());
    }
}
