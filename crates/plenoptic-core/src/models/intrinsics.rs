use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::math::{Mat3, Real};

/// Projection model of the host camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionKind {
    #[default]
    Perspective,
    Orthographic,
    Panoramic,
}

/// Which sensor dimension stays fixed when deriving the field of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorFit {
    /// Pick horizontal or vertical from the image aspect.
    #[default]
    Auto,
    Horizontal,
    Vertical,
}

/// Optical parameters of the template camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraLens {
    pub projection: ProjectionKind,
    /// Focal length in millimetres.
    pub lens_mm: Real,
    pub sensor_fit: SensorFit,
    pub sensor_width_mm: Real,
    pub sensor_height_mm: Real,
    /// Horizontal field of view in radians, as reported by the host.
    pub angle_x: Real,
    /// Vertical field of view in radians, as reported by the host.
    pub angle_y: Real,
}

impl CameraLens {
    /// Perspective lens with angles derived from the sensor extents.
    pub fn perspective(
        lens_mm: Real,
        sensor_width_mm: Real,
        sensor_height_mm: Real,
        sensor_fit: SensorFit,
    ) -> Self {
        Self {
            projection: ProjectionKind::Perspective,
            lens_mm,
            sensor_fit,
            sensor_width_mm,
            sensor_height_mm,
            angle_x: fov_from_focal(lens_mm, sensor_width_mm),
            angle_y: fov_from_focal(lens_mm, sensor_height_mm),
        }
    }
}

impl Default for CameraLens {
    fn default() -> Self {
        Self::perspective(50.0, 36.0, 24.0, SensorFit::Auto)
    }
}

/// Field of view (radians) of a sensor extent behind a lens.
pub fn fov_from_focal(lens_mm: Real, sensor_mm: Real) -> Real {
    2.0 * (sensor_mm / (2.0 * lens_mm)).atan()
}

/// Output image container chosen in the render settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    OpenExr,
    Tiff,
    Bmp,
}

impl ImageFormat {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::OpenExr => "exr",
            ImageFormat::Tiff => "tif",
            ImageFormat::Bmp => "bmp",
        }
    }
}

/// Render output settings shared by every camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    pub resolution_x: u32,
    pub resolution_y: u32,
    /// Resolution scale in percent.
    pub resolution_percentage: u32,
    pub pixel_aspect_x: Real,
    pub pixel_aspect_y: Real,
    pub file_format: ImageFormat,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            resolution_x: 1920,
            resolution_y: 1080,
            resolution_percentage: 100,
            pixel_aspect_x: 1.0,
            pixel_aspect_y: 1.0,
            file_format: ImageFormat::Png,
        }
    }
}

impl RenderSettings {
    /// Effective pixel size `(w, h)` after percentage scaling.
    pub fn scaled_size(&self) -> (Real, Real) {
        let scale = Real::from(self.resolution_percentage) / 100.0;
        (
            Real::from(self.resolution_x) * scale,
            Real::from(self.resolution_y) * scale,
        )
    }
}

/// Pinhole intrinsics shared by every camera of a capture.
///
/// Distortion coefficients are carried for format compatibility and are
/// always zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    /// Rendered image size in pixels, the scaled resolution rounded down.
    pub width: u32,
    pub height: u32,
    pub fl_x: Real,
    pub fl_y: Real,
    /// Half the unrounded scaled width. Differs from `width / 2` only when
    /// the resolution percentage leaves a fractional size.
    pub cx: Real,
    /// Half the unrounded scaled height.
    pub cy: Real,
    pub k1: Real,
    pub k2: Real,
    pub p1: Real,
    pub p2: Real,
    pub camera_angle_x: Real,
    pub camera_angle_y: Real,
    /// Sensor fit after resolving `Auto`.
    pub sensor_fit: SensorFit,
}

impl Intrinsics {
    /// Return the 3x3 camera intrinsics matrix K.
    pub fn k_matrix(&self) -> Mat3 {
        Mat3::new(
            self.fl_x, 0.0, self.cx, //
            0.0, self.fl_y, self.cy, //
            0.0, 0.0, 1.0,
        )
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IntrinsicsError {
    #[error("only perspective cameras are supported, got {0:?}")]
    NotPerspective(ProjectionKind),
    #[error("render resolution must be positive, got {width}x{height} at {percentage}%")]
    InvalidResolution {
        width: u32,
        height: u32,
        percentage: u32,
    },
    #[error("focal length must be positive, got {0} mm")]
    InvalidLens(Real),
    #[error("sensor size must be positive, got {width} x {height} mm")]
    InvalidSensor { width: Real, height: Real },
    #[error("pixel aspect must be positive, got {x}:{y}")]
    InvalidPixelAspect { x: Real, y: Real },
}

/// Compute pinhole intrinsics from render settings and the template lens.
///
/// `Auto` sensor fit is resolved from the pixel aspect of the image, with
/// square images decided by the physical (pixel-aspect-scaled) extents.
/// When the resolved fit is vertical on a portrait or square image the
/// reported field-of-view angles are swapped.
pub fn compute_intrinsics(
    render: &RenderSettings,
    lens: &CameraLens,
) -> Result<Intrinsics, IntrinsicsError> {
    if lens.projection != ProjectionKind::Perspective {
        return Err(IntrinsicsError::NotPerspective(lens.projection));
    }
    if render.resolution_x == 0 || render.resolution_y == 0 || render.resolution_percentage == 0 {
        return Err(IntrinsicsError::InvalidResolution {
            width: render.resolution_x,
            height: render.resolution_y,
            percentage: render.resolution_percentage,
        });
    }
    if !(lens.lens_mm > 0.0) {
        return Err(IntrinsicsError::InvalidLens(lens.lens_mm));
    }
    if !(lens.sensor_width_mm > 0.0 && lens.sensor_height_mm > 0.0) {
        return Err(IntrinsicsError::InvalidSensor {
            width: lens.sensor_width_mm,
            height: lens.sensor_height_mm,
        });
    }
    if !(render.pixel_aspect_x > 0.0 && render.pixel_aspect_y > 0.0) {
        return Err(IntrinsicsError::InvalidPixelAspect {
            x: render.pixel_aspect_x,
            y: render.pixel_aspect_y,
        });
    }

    let (w, h) = render.scaled_size();
    let size_x = render.pixel_aspect_x * w;
    let size_y = render.pixel_aspect_y * h;
    let pixel_aspect_ratio = render.pixel_aspect_x / render.pixel_aspect_y;

    let mut angle_x = lens.angle_x;
    let mut angle_y = lens.angle_y;
    let mut sensor_mm = lens.sensor_width_mm;

    let fit = match lens.sensor_fit {
        SensorFit::Auto => {
            if w < h {
                sensor_mm = lens.sensor_height_mm;
                std::mem::swap(&mut angle_x, &mut angle_y);
                SensorFit::Vertical
            } else if w > h {
                SensorFit::Horizontal
            } else if size_x <= size_y {
                SensorFit::Vertical
            } else {
                SensorFit::Horizontal
            }
        }
        SensorFit::Vertical => {
            if w <= h {
                sensor_mm = lens.sensor_height_mm;
                std::mem::swap(&mut angle_x, &mut angle_y);
            }
            SensorFit::Vertical
        }
        SensorFit::Horizontal => SensorFit::Horizontal,
    };

    let (fl_x, fl_y) = match fit {
        SensorFit::Vertical => (
            lens.lens_mm / sensor_mm * w / pixel_aspect_ratio,
            lens.lens_mm / sensor_mm * w,
        ),
        _ => {
            let sensor_mm = lens.sensor_width_mm;
            (
                lens.lens_mm / sensor_mm * w,
                lens.lens_mm / sensor_mm * w * pixel_aspect_ratio,
            )
        }
    };

    log::debug!("intrinsics: {w}x{h} px, fit {fit:?}, fl=({fl_x:.3}, {fl_y:.3})");

    Ok(Intrinsics {
        width: w.floor() as u32,
        height: h.floor() as u32,
        fl_x,
        fl_y,
        cx: w / 2.0,
        cy: h / 2.0,
        k1: 0.0,
        k2: 0.0,
        p1: 0.0,
        p2: 0.0,
        camera_angle_x: angle_x,
        camera_angle_y: angle_y,
        sensor_fit: fit,
    })
}
