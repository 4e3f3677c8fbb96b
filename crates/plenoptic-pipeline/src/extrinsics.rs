//! Per-frame, per-camera extrinsics.
//!
//! The canonical form is camera-to-world in the host convention. Other
//! forms are derived through [`ExtrinsicsConvention`].

use plenoptic_core::{Convention, Mat4, is_finite_mat4};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtrinsicsError {
    #[error("camera {camera} has a singular transform at frame {frame}")]
    Singular { frame: usize, camera: usize },
    #[error("camera {camera} has a non-finite transform at frame {frame}")]
    NonFinite { frame: usize, camera: usize },
    #[error("frame {frame} has {found} cameras, expected {expected}")]
    RaggedFrame {
        frame: usize,
        found: usize,
        expected: usize,
    },
    #[error("extrinsics need at least one frame and one camera")]
    Empty,
}

/// Direction and axis convention of emitted transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtrinsicsConvention {
    CameraToWorld { axes: Convention },
    WorldToCamera { axes: Convention },
}

impl ExtrinsicsConvention {
    /// Canonical form: host camera-to-world.
    pub const HOST_C2W: Self = Self::CameraToWorld {
        axes: Convention::Host,
    };

    pub fn axes(self) -> Convention {
        match self {
            Self::CameraToWorld { axes } | Self::WorldToCamera { axes } => axes,
        }
    }

    fn apply(self, c2w: &Mat4, frame: usize, camera: usize) -> Result<Mat4, ExtrinsicsError> {
        if !is_finite_mat4(c2w) {
            return Err(ExtrinsicsError::NonFinite { frame, camera });
        }
        let converted = self.axes().apply_to_pose(c2w);
        match self {
            Self::CameraToWorld { .. } => Ok(converted),
            Self::WorldToCamera { .. } => converted
                .try_inverse()
                .filter(is_finite_mat4)
                .ok_or(ExtrinsicsError::Singular { frame, camera }),
        }
    }
}

/// Transforms stored once for static rigs or once per frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameLayout {
    Static(Vec<Mat4>),
    PerFrame(Vec<Vec<Mat4>>),
}

/// Extrinsics indexed `[frame][camera]`.
///
/// Static layouts are stored once and broadcast over every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrinsicsGrid {
    layout: FrameLayout,
    num_frames: usize,
}

impl ExtrinsicsGrid {
    /// Static rig shared by `num_frames` frames.
    pub fn from_static(poses: Vec<Mat4>, num_frames: usize) -> Self {
        Self {
            layout: FrameLayout::Static(poses),
            num_frames,
        }
    }

    /// One row of poses per frame. Rows must have equal length.
    pub fn from_frames(frames: Vec<Vec<Mat4>>) -> Result<Self, ExtrinsicsError> {
        let expected = frames.first().map(Vec::len).ok_or(ExtrinsicsError::Empty)?;
        if expected == 0 {
            return Err(ExtrinsicsError::Empty);
        }
        if let Some((frame, row)) = frames
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != expected)
        {
            return Err(ExtrinsicsError::RaggedFrame {
                frame,
                found: row.len(),
                expected,
            });
        }
        Ok(Self {
            num_frames: frames.len(),
            layout: FrameLayout::PerFrame(frames),
        })
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    pub fn is_static(&self) -> bool {
        matches!(self.layout, FrameLayout::Static(_))
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn num_cameras(&self) -> usize {
        match &self.layout {
            FrameLayout::Static(poses) => poses.len(),
            FrameLayout::PerFrame(frames) => frames.first().map_or(0, Vec::len),
        }
    }

    /// Poses of every camera at frame index `t`.
    ///
    /// # Panics
    ///
    /// Panics if `t >= num_frames()`.
    pub fn frame(&self, t: usize) -> &[Mat4] {
        assert!(t < self.num_frames, "frame {t} out of range");
        match &self.layout {
            FrameLayout::Static(poses) => poses,
            FrameLayout::PerFrame(frames) => &frames[t],
        }
    }

    pub fn get(&self, t: usize, camera: usize) -> &Mat4 {
        &self.frame(t)[camera]
    }
}

/// Re-express canonical host camera-to-world extrinsics in `convention`.
///
/// Static grids stay static. A singular or non-finite transform aborts
/// with the offending frame and camera.
pub fn compute_extrinsics(
    c2w: &ExtrinsicsGrid,
    convention: ExtrinsicsConvention,
) -> Result<ExtrinsicsGrid, ExtrinsicsError> {
    let convert_row = |frame: usize, row: &[Mat4]| {
        row.iter()
            .enumerate()
            .map(|(camera, pose)| convention.apply(pose, frame, camera))
            .collect::<Result<Vec<_>, _>>()
    };
    let layout = match &c2w.layout {
        FrameLayout::Static(poses) => FrameLayout::Static(convert_row(0, poses)?),
        FrameLayout::PerFrame(frames) => FrameLayout::PerFrame(
            frames
                .iter()
                .enumerate()
                .map(|(t, row)| convert_row(t, row))
                .collect::<Result<Vec<_>, _>>()?,
        ),
    };
    log::debug!(
        "computed {:?} extrinsics for {} frames x {} cameras",
        convention,
        c2w.num_frames,
        c2w.num_cameras()
    );
    Ok(ExtrinsicsGrid {
        layout,
        num_frames: c2w.num_frames,
    })
}
