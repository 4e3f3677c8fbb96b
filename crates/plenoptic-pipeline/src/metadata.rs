//! Dataset metadata assembly and the `meta.json` document.
//!
//! [`DatasetMetadata`] pairs the shared intrinsics with the `[frame][camera]`
//! extrinsics, a filename manifest and a camera-ID grid. All three grids
//! must agree on their leading `(frames, cameras)` dimensions.

use plenoptic_core::{Intrinsics, Real, mat3_rows, mat4_rows};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::extrinsics::{ExtrinsicsConvention, ExtrinsicsError, ExtrinsicsGrid, compute_extrinsics};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("{grid} has {found} frames, expected {expected}")]
    FrameCount {
        grid: &'static str,
        found: usize,
        expected: usize,
    },
    #[error("{grid} frame {frame} has {found} cameras, expected {expected}")]
    CameraCount {
        grid: &'static str,
        frame: usize,
        found: usize,
        expected: usize,
    },
    #[error("metadata must contain at least one frame and one camera")]
    Empty,
    #[error(transparent)]
    Extrinsics(#[from] ExtrinsicsError),
}

/// Image file naming inside the dataset `ims/` folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNaming {
    /// Extension without the dot, e.g. `png`.
    pub extension: String,
    /// Zero padding of the frame index.
    pub padding: usize,
}

impl Default for FileNaming {
    fn default() -> Self {
        Self {
            extension: "png".to_string(),
            padding: 6,
        }
    }
}

impl FileNaming {
    /// `{camera}/{t}.{ext}` with `t` relative to the first frame.
    pub fn file_name(&self, camera: usize, t: usize) -> String {
        format!(
            "{camera}/{t:0width$}.{ext}",
            width = self.padding,
            ext = self.extension
        )
    }
}

/// Everything written about a capture, indexed `[frame][camera]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetMetadata {
    pub intrinsics: Intrinsics,
    /// Canonical host camera-to-world extrinsics.
    pub extrinsics: ExtrinsicsGrid,
    pub file_names: Vec<Vec<String>>,
    pub camera_ids: Vec<Vec<usize>>,
}

impl DatasetMetadata {
    /// Build the manifest and camera-ID grids for `extrinsics`.
    pub fn assemble(
        intrinsics: Intrinsics,
        extrinsics: ExtrinsicsGrid,
        naming: &FileNaming,
    ) -> Result<Self, MetadataError> {
        let frames = extrinsics.num_frames();
        let cameras = extrinsics.num_cameras();
        if frames == 0 || cameras == 0 {
            return Err(MetadataError::Empty);
        }
        let file_names = (0..frames)
            .map(|t| (0..cameras).map(|c| naming.file_name(c, t)).collect())
            .collect();
        let camera_ids = (0..frames).map(|_| (0..cameras).collect()).collect();
        let metadata = Self {
            intrinsics,
            extrinsics,
            file_names,
            camera_ids,
        };
        metadata.check_shapes()?;
        Ok(metadata)
    }

    pub fn num_frames(&self) -> usize {
        self.extrinsics.num_frames()
    }

    pub fn num_cameras(&self) -> usize {
        self.extrinsics.num_cameras()
    }

    /// Verify that every grid shares the `(frames, cameras)` shape.
    pub fn check_shapes(&self) -> Result<(), MetadataError> {
        let frames = self.num_frames();
        let cameras = self.num_cameras();
        check_grid("fn", &self.file_names, frames, cameras)?;
        check_grid("cam_id", &self.camera_ids, frames, cameras)
    }

    /// The `meta.json` document with extrinsics in `convention`.
    pub fn to_meta_json(&self, convention: ExtrinsicsConvention) -> Result<MetaJson, MetadataError> {
        let converted = compute_extrinsics(&self.extrinsics, convention)?;
        let k = mat3_rows(&self.intrinsics.k_matrix());
        let frames = self.num_frames();
        let cameras = self.num_cameras();
        let meta = MetaJson {
            w: self.intrinsics.width,
            h: self.intrinsics.height,
            k: vec![vec![k; cameras]; frames],
            w2c: (0..frames)
                .map(|t| converted.frame(t).iter().map(mat4_rows).collect())
                .collect(),
            file_names: self.file_names.clone(),
            cam_id: self.camera_ids.clone(),
        };
        meta.validate()?;
        Ok(meta)
    }
}

fn check_grid<T>(
    grid: &'static str,
    rows: &[Vec<T>],
    frames: usize,
    cameras: usize,
) -> Result<(), MetadataError> {
    if rows.len() != frames {
        return Err(MetadataError::FrameCount {
            grid,
            found: rows.len(),
            expected: frames,
        });
    }
    if let Some((frame, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != cameras) {
        return Err(MetadataError::CameraCount {
            grid,
            frame,
            found: row.len(),
            expected: cameras,
        });
    }
    Ok(())
}

/// `meta.json`: per-frame, per-camera calibration for dynamic scene
/// reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaJson {
    pub w: u32,
    pub h: u32,
    /// Intrinsic matrices, `[frame][camera]`.
    pub k: Vec<Vec<[[Real; 3]; 3]>>,
    /// World-to-camera matrices, `[frame][camera]`.
    pub w2c: Vec<Vec<[[Real; 4]; 4]>>,
    /// Image paths relative to `ims/`, `[frame][camera]`.
    #[serde(rename = "fn")]
    pub file_names: Vec<Vec<String>>,
    pub cam_id: Vec<Vec<usize>>,
}

impl MetaJson {
    pub fn num_frames(&self) -> usize {
        self.w2c.len()
    }

    pub fn num_cameras(&self) -> usize {
        self.w2c.first().map_or(0, Vec::len)
    }

    /// Every grid must share the `(frames, cameras)` shape of `w2c`.
    pub fn validate(&self) -> Result<(), MetadataError> {
        let frames = self.num_frames();
        let cameras = self.num_cameras();
        if frames == 0 || cameras == 0 {
            return Err(MetadataError::Empty);
        }
        check_grid("w2c", &self.w2c, frames, cameras)?;
        check_grid("k", &self.k, frames, cameras)?;
        check_grid("fn", &self.file_names, frames, cameras)?;
        check_grid("cam_id", &self.cam_id, frames, cameras)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::to_json_string;
    use plenoptic_core::{CameraLens, Convention, Mat4, RenderSettings, SensorFit, compute_intrinsics};

    fn intrinsics() -> Intrinsics {
        let render = RenderSettings {
            resolution_x: 800,
            resolution_y: 600,
            ..RenderSettings::default()
        };
        compute_intrinsics(&render, &CameraLens::perspective(50.0, 36.0, 24.0, SensorFit::Auto))
            .unwrap()
    }

    fn opencv_w2c() -> ExtrinsicsConvention {
        ExtrinsicsConvention::WorldToCamera {
            axes: Convention::OpenCv,
        }
    }

    #[test]
    fn file_names_are_padded_and_relative() {
        let naming = FileNaming::default();
        assert_eq!(naming.file_name(3, 12), "3/000012.png");
        let short = FileNaming {
            extension: "jpg".into(),
            padding: 2,
        };
        assert_eq!(short.file_name(0, 7), "0/07.jpg");
    }

    #[test]
    fn static_rig_fills_every_frame() {
        let poses = vec![Mat4::new_translation(&[0.0, 0.0, 4.0].into()); 3];
        let grid = ExtrinsicsGrid::from_static(poses, 4);
        let meta = DatasetMetadata::assemble(intrinsics(), grid, &FileNaming::default()).unwrap();
        assert_eq!(meta.num_frames(), 4);
        assert_eq!(meta.num_cameras(), 3);
        assert_eq!(meta.camera_ids[3], vec![0, 1, 2]);
        assert_eq!(meta.file_names[2][1], "1/000002.png");

        let doc = meta.to_meta_json(opencv_w2c()).unwrap();
        assert_eq!(doc.k.len(), 4);
        assert_eq!(doc.k[3][2][0], [50.0 / 36.0 * 800.0, 0.0, 400.0]);
        assert_eq!(doc.w2c[0], doc.w2c[3]);
        assert_eq!((doc.w, doc.h), (800, 600));
    }

    #[test]
    fn meta_json_serializes_fn_key_and_is_byte_stable() {
        let grid = ExtrinsicsGrid::from_frames(vec![
            vec![Mat4::new_translation(&[1.0, 2.0, 3.0].into())],
            vec![Mat4::new_translation(&[0.25, -2.0, 3.5].into())],
        ])
        .unwrap();
        let meta = DatasetMetadata::assemble(intrinsics(), grid, &FileNaming::default()).unwrap();
        let doc = meta.to_meta_json(opencv_w2c()).unwrap();
        let text = to_json_string(&doc).unwrap();
        assert!(text.contains("\"fn\": ["));
        assert!(!text.contains("file_names"));

        let back: MetaJson = serde_json::from_str(&text).unwrap();
        assert_eq!(back, doc);
        assert_eq!(to_json_string(&back).unwrap(), text);
    }

    #[test]
    fn validate_reports_mismatched_grids() {
        let grid = ExtrinsicsGrid::from_static(vec![Mat4::identity(); 2], 2);
        let meta = DatasetMetadata::assemble(intrinsics(), grid, &FileNaming::default()).unwrap();
        let mut doc = meta.to_meta_json(ExtrinsicsConvention::HOST_C2W).unwrap();
        assert!(doc.validate().is_ok());

        doc.file_names[1].pop();
        assert_eq!(
            doc.validate(),
            Err(MetadataError::CameraCount {
                grid: "fn",
                frame: 1,
                found: 1,
                expected: 2
            })
        );
        doc.file_names.pop();
        assert!(matches!(
            doc.validate(),
            Err(MetadataError::FrameCount { grid: "fn", .. })
        ));
    }

    #[test]
    fn singular_pose_aborts_meta_assembly() {
        let grid = ExtrinsicsGrid::from_static(vec![Mat4::zeros()], 1);
        let meta = DatasetMetadata::assemble(intrinsics(), grid, &FileNaming::default()).unwrap();
        assert!(matches!(
            meta.to_meta_json(ExtrinsicsConvention::WorldToCamera {
                axes: Convention::Host
            }),
            Err(MetadataError::Extrinsics(ExtrinsicsError::Singular { frame: 0, camera: 0 }))
        ));
    }
}
