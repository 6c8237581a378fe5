//! # rammachine-error
//!
//! Unified error handling for the rammachine workspace.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what error occurred (e.g., DivisionByZero, LabelNotFound)
//! - **ErrorTier**: Know who has to act on it (machine author, program author, run inputs, host)
//! - **Error Context**: Assist in locating the cause (offending operation, source line)
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use rammachine_error::{Error, ErrorKind, ErrorTier};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::DivisionByZero, "attempted to divide by zero")
//!         .with_operation("ram::div")
//!         .with_context("operation", "4: DIV 3"))
//! }
//!
//! let err = example().unwrap_err();
//! assert_eq!(err.tier(), ErrorTier::Runtime);
//! ```
//!
//! ## Principles
//!
//! - All functions return `Result<T, rammachine_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent layers only append context
//! - Don't abuse `From<OtherError>` to prevent raw error leakage

mod error;
mod kind;
mod tier;

pub use error::Error;
pub use kind::ErrorKind;
pub use tier::ErrorTier;

/// Result type alias using rammachine Error
pub type Result<T> = std::result::Result<T, Error>;
