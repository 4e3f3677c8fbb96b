//! Core math and geometry primitives for plenoptic dataset generation.
//!
//! This crate provides the building blocks used by the pipeline crate:
//!
//! - linear algebra type aliases (`Real`, `Vec3`, `Pt3`, `Mat4`, ...),
//! - conversion between the host and OpenCV/COLMAP coordinate conventions,
//! - deterministic camera position samplers on a sphere,
//! - camera lens / render settings models and pinhole intrinsics,
//! - geometry snapshots used for point-cloud export and resampling.
//!
//! # Modules
//!
//! - \[`math`\]: type aliases and matrix helpers.
//! - \[`convention`\]: pose and geometry convention transforms.
//! - \[`sampler`\]: random-uniform and golden-angle sphere samplers.
//! - \[`models`\]: camera lens, render settings and intrinsics.
//! - \[`geometry`\]: vertex/face snapshots.
//!
//! # Example
//!
//! ```no_run
//! use plenoptic_core::{CameraLens, RenderSettings, SensorFit, compute_intrinsics};
//!
//! let render = RenderSettings {
//!     resolution_x: 800,
//!     resolution_y: 600,
//!     ..RenderSettings::default()
//! };
//! let lens = CameraLens::perspective(50.0, 36.0, 24.0, SensorFit::Auto);
//! let k = compute_intrinsics(&render, &lens).unwrap();
//! assert_eq!(k.cx, 400.0);
//! ```

/// Pose and geometry conversion to the OpenCV convention.
pub mod convention;
/// Geometry snapshots.
mod geometry;
/// Linear algebra type aliases and helpers.
mod math;
/// Camera lens, render settings and intrinsics.
mod models;
/// Deterministic sphere samplers.
pub mod sampler;

pub use convention::Convention;
pub use geometry::*;
pub use math::*;
pub use models::*;
pub use sampler::{
    CameraLayout, CameraPose, Distribution, Mt19937, PlacementRequest, SamplerError, SphereSpec,
};
