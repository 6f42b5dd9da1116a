//! Pipeline stages for a single document.
//!
//! Each submodule implements exactly one step, so each is independently
//! testable and the orchestrator in [`crate::batch`] only sequences them.
//!
//! ## Data Flow
//!
//! ```text
//! stage ──▶ extract ──▶ metrics
//! (temp file)  (engine)   (size label, delta %)
//! ```
//!
//! 1. [`stage`]   — write the document bytes to a uniquely named temp file
//!    that keeps the original extension; released on every exit path
//! 2. [`extract`] — call the extraction engine; the only stage that can hit
//!    an external process, and the boundary where engine faults are caught
//! 3. [`metrics`] — human-readable sizes and the size-reduction percentage

pub mod extract;
pub mod metrics;
pub mod stage;
