//! strato-mock - programmable in-memory stand-in for the strato API.
//!
//! Serves the same REST surface the live backend would, with a simulated
//! asynchronous lifecycle: a created or updated resource reports a
//! transitional state until it has been read a configurable number of times,
//! then settles to Active. Control endpoints let a test force a state or
//! reconfigure the settle behavior.

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{MockState, SharedState};
