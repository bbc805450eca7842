//! dbconsole: terminal client for an administrative database backend.
//!
//! The crate owns the client side of the session lifecycle (login, guard,
//! expiry countdown, teardown) and a confirmation-gated command console whose
//! history survives console re-initialisation for the lifetime of the session.
//!
//! The client-side guard and countdown are a convenience for the operator, not a
//! security boundary: the backend must enforce its own credential expiry and
//! authorization on every request.

pub mod error;
pub mod config;
pub mod storage;
pub mod session;
pub mod gateway;
pub mod console;
pub mod catalog;

pub use error::{ConsoleError, ConsoleResult};
