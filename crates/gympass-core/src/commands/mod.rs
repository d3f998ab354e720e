//! Operator-facing actions.
//!
//! Every function takes the process [`Gym`](crate::Gym) and returns either a
//! [`Reply`] (a message for the operator plus structured data) or a
//! human-readable error string. Front ends print the message and may render
//! the data as JSON.

pub mod attendance;
pub mod backup;
pub mod barcodes;
pub mod clients;

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Reply<T> {
    pub message: String,
    pub data: T,
}

impl<T> Reply<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

pub type CommandResult<T> = Result<Reply<T>, String>;
