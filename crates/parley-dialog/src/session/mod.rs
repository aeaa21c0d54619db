//! Dialogue sessions and the manager that serializes access to them.
//!
//! Per stateful dialogue: `FRESH --query--> PRIMED --user_query--> PRIMED`.
//! A stateless dialogue returns to `FRESH` after every query.

mod dialogue;
mod manager;


pub use manager::SessionManager;
