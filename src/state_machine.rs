//! Conversation session state machine
//!
//! Pure transitions in the Elm style: the runtime feeds events in, applies
//! the returned session and executes the returned effects.

mod effect;
mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{ChatState, Exchange, Session};
pub use transition::{transition, TransitionError};
