//! # gympass-shared
//!
//! Storage-free domain kernel shared by every gympass crate: record status
//! enums, the badge token format, the Code128 symbology and the raster
//! renderer that turns a token into a scannable image.

pub mod code128;
pub mod constants;
pub mod error;
pub mod symbol;
pub mod token;
pub mod types;

pub use error::{SymbolError, TokenError};
pub use token::{Token, TokenGenerator, TokenScheme};
pub use types::*;
