use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Caller-supplied data violates a generator precondition.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Input does not have the shape of a badge token at all.
    #[error("Not a badge token")]
    Invalid,

    /// The prefix matched but the embedded client id is corrupt.
    #[error("Malformed badge token: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum SymbolError {
    #[error("Character {ch:?} at position {position} cannot be encoded in Code128")]
    UnsupportedCharacter { ch: char, position: usize },

    #[error("Nothing to encode")]
    Empty,

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
