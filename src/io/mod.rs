//! Input/output helpers.
//!
//! - delimited-text ingest + validation (`ingest`)
//! - spectrum / fit decomposition exports (`export`)
//! - config and session JSON (`session`)
//! - directory batch conversion (`convert`)

pub mod convert;
pub mod export;
pub mod ingest;
pub mod session;

pub use convert::*;
pub use export::*;
pub use ingest::*;
pub use session::*;
