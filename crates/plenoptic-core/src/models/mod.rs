//! Camera and render-settings models.
//!
//! The host exposes its template camera as a [`CameraLens`] and its output
//! configuration as [`RenderSettings`]; [`compute_intrinsics`] turns the
//! pair into pinhole [`Intrinsics`] shared by every generated camera.

mod intrinsics;

pub use intrinsics::*;
