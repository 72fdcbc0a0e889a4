//! Service availability checks.
//!
//! Each check verifies that a remote service is reachable and behaving
//! correctly: an SSH server accepts a login and runs a command, a VNC server
//! completes its authentication handshake. A check is initialized once from
//! an untyped definition document, then run on a schedule by an external
//! orchestrator with a bounded time budget. Every probe reports a uniform
//! [`CheckResult`] whether it passed, failed, or ran out of time, so the
//! orchestrator only ever branches on `passed` and reads `message` for
//! diagnostics.
//!
//! Protocol clients are consumed as opaque capability objects
//! ([`ssh::SshTransport`], [`vnc::VncHandshake`]) injected at construction;
//! this crate orchestrates their use under a deadline, it does not implement
//! the wire protocols.

pub mod check;
pub mod error;
pub mod runner;
pub mod ssh;
pub mod types;
pub mod vnc;

pub use check::{Check, Registry};
pub use error::ValidationError;
pub use runner::{CheckRunner, race_deadline};
pub use ssh::SshCheck;
pub use types::{CheckConfig, CheckResult};
pub use vnc::VncCheck;
