//! Crate-wide error type and the `err_at!` macro used to raise it.
//!
//! Every fallible call site in this crate is wrapped with `err_at!`, which
//! tags the error with the `file!():line!()` of the call site before
//! converting it into a variant of [Error]. This keeps error messages
//! traceable to the originating check without a backtrace capture.

use std::{fmt, result};

/// Error kinds surfaced by this crate. See spec §7 for the semantics of
/// each kind.
#[derive(Debug)]
pub enum Error {
    /// Any underlying filesystem or mmap failure. Never retried internally.
    IoFailure(String, String),
    /// A precondition was violated by the caller: non-record-boundary
    /// write, two CANONICAL_ORDERING fields, multi-threaded write without
    /// a canonical field, or a record-file size that is not a multiple of
    /// the record size (corruption, detected only as a precondition).
    Precondition(String, String),
    /// Queried a field whose schema does not declare it indexable.
    NotIndexed(String, String),
    /// Memory mapping was refused by the OS. Surfaced to callers other
    /// than [crate::store::AdaptiveStore], which recovers locally.
    ResourceExhausted(String, String),
    /// An invariant the crate itself is responsible for was violated;
    /// should be unreachable in correct operation.
    Fatal(String, String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        match self {
            Error::IoFailure(p, m) => write!(f, "IoFailure<{}> {}", p, m),
            Error::Precondition(p, m) => write!(f, "Precondition<{}> {}", p, m),
            Error::NotIndexed(p, m) => write!(f, "NotIndexed<{}> {}", p, m),
            Error::ResourceExhausted(p, m) => write!(f, "ResourceExhausted<{}> {}", p, m),
            Error::Fatal(p, m) => write!(f, "Fatal<{}> {}", p, m),
        }
    }
}

impl std::error::Error for Error {}

/// Crate-wide `Result` alias.
pub type Result<T> = result::Result<T, Error>;

#[macro_export]
macro_rules! err_at {
    ($v:ident, msg: $($arg:expr),+) => {{
        let prefix = format!("{}:{}", file!(), line!());
        Err($crate::Error::$v(prefix, format!($($arg),+)))
    }};
    ($v:ident, $e:expr) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                Err($crate::Error::$v(prefix, format!("{}", err)))
            }
        }
    }};
    ($v:ident, $e:expr, $($arg:expr),+) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                let msg = format!($($arg),+);
                Err($crate::Error::$v(prefix, format!("{}: {}", msg, err)))
            }
        }
    }};
}
