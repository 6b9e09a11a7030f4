//! Child process supervision for the browser helper and meek-client.

pub mod child;
pub mod client;
pub mod helper;

pub use child::{ChildRole, ShutdownOutcome, SupervisedChild};
