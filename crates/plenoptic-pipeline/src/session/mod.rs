//! Session framework.
//!
//! A [`DatasetSession`] is a mutable state container for one
//! [`ProblemType`]. Step functions take `&mut DatasetSession<P>` and move
//! it forward:
//!
//! ```no_run
//! use plenoptic_pipeline::capture::{CaptureProblem, step_prepare_scene};
//! use plenoptic_pipeline::session::DatasetSession;
//! use plenoptic_pipeline::standalone::StandaloneHost;
//! # fn main() -> anyhow::Result<()> {
//! let mut host = StandaloneHost::from_file("scene.json".as_ref())?;
//! let mut session = DatasetSession::<CaptureProblem>::new();
//! step_prepare_scene(&mut session, &mut host, None)?;
//! # Ok(())
//! # }
//! ```

mod dataset_session;
mod problem_type;
mod types;

pub use dataset_session::DatasetSession;
pub use problem_type::{InvalidationPolicy, ProblemType};
pub use types::{ExportRecord, LogEntry, SessionMetadata};
