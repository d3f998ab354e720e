//! # gympass-core
//!
//! Badge lifecycle and check-in services for a single-site gym.
//!
//! - [`artifacts`]: where rendered badges live and how they are written
//! - [`lifecycle`]: issuing, activating, deactivating and renewing badges
//! - [`scan`]: resolving scanner input to an outcome and checking members in
//! - [`attendance`]: the check-in policy
//! - [`commands`]: operator-facing actions returning human-readable replies
//!
//! Every service borrows a [`gympass_store::RecordStore`] handed to it at
//! construction; [`Gym`] wires them to the SQLite database for a process.

pub mod artifacts;
pub mod attendance;
pub mod commands;
pub mod config;
pub mod lifecycle;
pub mod scan;
pub mod state;

mod error;

#[cfg(test)]
mod testing;

pub use error::{GymError, Result};
pub use state::Gym;
