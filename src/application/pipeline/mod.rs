//! Turn pipeline and its per-turn helpers.

mod keyed_locks;
mod recorder;
mod turn_pipeline;

pub use keyed_locks::KeyedLocks;
pub use recorder::TranscriptRecorder;
pub use turn_pipeline::{TurnError, TurnOutcome, TurnPipeline, TurnSettings};
