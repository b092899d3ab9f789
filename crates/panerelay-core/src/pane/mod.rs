//! Pane module - raw capture normalisation and incremental line tracking
//!
//! # Components
//! - `Snapshot`: one normalised capture of the pane
//! - `DiffTracker`: cursor over already-processed lines

mod diff;
mod snapshot;

pub use diff::{DiffTracker, LineDelta};
pub use snapshot::{normalize, strip_ansi, Snapshot};
