//! Session lifecycle and command execution.
//!
//! A [`Session`] is created by [`SessionBuilder::open`], which runs the
//! login handshake; [`Session::send`] then executes command batches until
//! the session is closed.

mod builder;
mod executor;
mod session;

pub use builder::SessionBuilder;
pub use executor::BatchOutput;
pub use session::{Session, SessionOptions};
