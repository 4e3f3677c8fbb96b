//! Render lifecycle and output folder reorganisation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::metadata::FileNaming;

pub const IMAGES_DIR: &str = "ims";

/// How a render job ended. Both outcomes run the same cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderOutcome {
    Completed,
    Cancelled,
}

/// Result of moving rendered frames into the dataset layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorganizeReport {
    pub moved: usize,
    pub missing: Vec<PathBuf>,
}

/// File name the renderer writes for `frame` of multiview `camera`.
pub fn rendered_file_name(frame: i64, camera: usize, extension: &str) -> String {
    format!("{frame:04}_{camera}.{extension}")
}

/// Move `{frame:04}_{camera}.{ext}` files from `output_dir` into
/// `ims/{camera}/{t}.{ext}`, with `t` relative to `first_frame`.
///
/// Missing frames (e.g. after a cancelled render) are reported and skipped.
pub fn reorganize_images(
    output_dir: &Path,
    camera_count: usize,
    frame_range: (i64, i64),
    naming: &FileNaming,
) -> Result<ReorganizeReport> {
    let (first, last) = frame_range;
    let images = output_dir.join(IMAGES_DIR);
    let mut report = ReorganizeReport::default();

    for frame in first..=last {
        let t = (frame - first) as usize;
        for camera in 0..camera_count {
            let source = output_dir.join(rendered_file_name(frame, camera, &naming.extension));
            if !source.is_file() {
                report.missing.push(source);
                continue;
            }
            let target = images.join(naming.file_name(camera, t));
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::rename(&source, &target).with_context(|| {
                format!("failed to move {} to {}", source.display(), target.display())
            })?;
            report.moved += 1;
        }
    }

    if !report.missing.is_empty() {
        log::warn!(
            "{} of {} rendered images are missing in {}",
            report.missing.len(),
            report.missing.len() + report.moved,
            output_dir.display()
        );
    }
    log::info!("moved {} images into {}", report.moved, images.display());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_are_moved_per_camera() -> Result<()> {
        let dir = tempfile::tempdir()?;
        for frame in 3..=4 {
            for camera in 0..2 {
                fs::write(dir.path().join(rendered_file_name(frame, camera, "png")), b"img")?;
            }
        }
        let report = reorganize_images(dir.path(), 2, (3, 4), &FileNaming::default())?;
        assert_eq!(report.moved, 4);
        assert!(report.missing.is_empty());
        assert!(dir.path().join("ims/1/000001.png").is_file());
        assert!(dir.path().join("ims/0/000000.png").is_file());
        assert!(!dir.path().join("0003_0.png").exists());
        Ok(())
    }

    #[test]
    fn missing_frames_are_reported() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("0001_0.png"), b"img")?;
        let report = reorganize_images(dir.path(), 1, (1, 3), &FileNaming::default())?;
        assert_eq!(report.moved, 1);
        assert_eq!(report.missing.len(), 2);
        assert!(report.missing[0].ends_with("0002_0.png"));
        Ok(())
    }
}
