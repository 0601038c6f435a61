//! Stack manifest types.
//!
//! A manifest is the declaration graph of one stack: every resource in the
//! order it was declared, the stack outputs, and stack-level settings.

mod types;

pub use types::*;
