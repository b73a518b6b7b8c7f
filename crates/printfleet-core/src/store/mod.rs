// ── Fleet state ──

mod registry;

pub use registry::{ApplyOutcome, PollHandle, Registry};
