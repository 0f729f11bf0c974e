//! Shared models for the `plum` workspace.
//!
//! Everything that crosses a crate boundary lives here: the run [`config`],
//! the error taxonomy in [`error`], the cancellation flag in [`signal`] and
//! the [`network`] models (target record, validators, interface lookup).

pub mod config;
pub mod error;
pub mod network;
pub mod signal;

pub use config::{Config, Context};
pub use error::{Phase, PlumError};
pub use network::target::Target;
pub use signal::StopSignal;
