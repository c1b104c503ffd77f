//! # Exploration State Machine
//!
//! Step-by-step protocol that grows a DE graph:
//!
//! ```text
//! situation_assessment -> problem_identification -> establish_intention -> choose_path
//!        ^                                                                    |
//!        +------------- pop pending_subsystems (decompose / solution) -------+
//!                                                                             |
//!                                                  worklist empty -> completed
//! ```
//!
//! `transition` is pure: it takes the current snapshot and one event and
//! returns the next snapshot. Decomposition enqueues sub-systems at the back
//! of a FIFO worklist, so siblings are drained breadth-first.
//!
//! Sub-systems are deduplicated within one decomposition. A name that shows
//! up again in a later decomposition is enqueued again and explored again.

mod auto;
mod state;
mod step;
mod transition;

pub use auto::{auto_explore, suggested_event};
pub use state::ExplorationState;
pub use step::{Event, Step};
pub use transition::{decomposition_pairs, transition, validate};
