//! Store change notifications
//!
//! This module provides:
//! - `StoreEvent`: typed events emitted after every successful load/mutation
//!   and whenever the session starts or ends
//! - `EventBus`: broadcast channel for distributing events to UI layers

mod bus;
mod types;

pub use bus::EventBus;
pub use types::{EventEmitter, StoreAction, StoreEvent};
