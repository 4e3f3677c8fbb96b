//! File formats used by the dataset pipeline.

pub mod json;
pub mod npz;
pub mod ply;

pub use json::{read_json, to_json_string, write_atomic, write_json};
pub use npz::{Array2, read_npz_array, write_npz};
pub use ply::{PlyError, convert_ply_to_opencv, read_ply, write_ply};
