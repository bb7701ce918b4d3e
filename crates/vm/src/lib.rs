//! skt virtual machine.
//!
//! A single-threaded fetch-decode-execute loop over the P-code produced by
//! `skt-compiler`. The VM performs no raw stdio of its own; all program
//! I/O goes through the host's [`Hooks`] implementation, and a shared
//! atomic flag can cancel execution at the next instruction boundary.

pub mod error;
pub mod hooks;
pub mod machine;

pub use error::RuntimeError;
pub use hooks::{BufferHooks, Hooks};
pub use machine::{execute, Outcome};
