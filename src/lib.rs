//! Spamwatch — event-triggered spam screening glue.
//!
//! Two independent workflows behind one small CLI:
//! - **notify**: object-created event → fetch raw email → classify via a
//!   hosted inference endpoint → reply to the sender with the verdict.
//! - **retrain**: drive a hosted notebook terminal over a websocket through
//!   a fixed reinstall-and-reexecute script.

pub mod classify;
pub mod config;
pub mod error;
pub mod mail;
pub mod pipeline;
pub mod retrain;
pub mod storage;
pub mod terminal;
