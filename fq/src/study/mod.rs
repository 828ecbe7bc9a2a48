//! Study sessions
//!
//! The queue builder, gesture interpreter and recurrence monitor are pure
//! building blocks; [`StudySession`] combines them into the state machine
//! the study views drive, and [`remote`] moves data between it and the API.

mod gesture;
mod queue;
mod recurrence;
pub mod remote;
mod session;

pub use gesture::{DEFAULT_SWIPE_THRESHOLD, GestureTracker, Swipe, interpret};
pub use queue::{CooldownGate, StudyQueue, build_queue};
pub use recurrence::{DEFAULT_POLL_INTERVAL, DueCard, RecurrenceMonitor};
pub use remote::{LoadError, SessionData, load_all, load_deck, submit_answer};
pub use session::{
    AnswerOutcome, AnswerTicket, SessionEvent, SessionPhase, SessionTiming, StudyMode, StudySession,
};
