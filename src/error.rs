use std::fmt;

/// Failures surfaced by [`TreeMap`](crate::TreeMap) and [`TreeKind`](crate::TreeKind).
///
/// Missing keys on `get`/`remove` are not errors; they are reported through
/// `Option` or `bool`. Only indexer-style access treats absence as a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Indexer-style access to a key that is not in the map.
    InvalidKey,
    /// The text does not name a tree engine.
    UnknownTreeKind(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidKey => write!(f, "invalid key"),
            Error::UnknownTreeKind(name) => {
                write!(f, "unknown tree kind {name:?}, expected \"avl\" or \"rb\"")
            }
        }
    }
}

impl std::error::Error for Error {}
