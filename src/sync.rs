//! Keeping the UI honest about network calls.
//!
//! Calls to the track source run on worker threads (`Requests`) and come back
//! as `NetEvent`s. View fetches carry a `Ticket` so that a slow, stale answer
//! cannot overwrite a newer one, and optimistic edits are tracked in a
//! `Ledger` so a failure restores exactly what was there before.

mod generation;
mod ledger;
mod requests;

pub use generation::{Generation, Ticket};
pub use ledger::{EditId, Ledger};
pub use requests::{NetEvent, Requests};
