//! Session state: the frame store and the controller that drives it.

pub mod controller;
pub mod store;

pub use controller::{SessionController, SessionView, SubmitError};
