//! CLI command implementations

pub(crate) mod common;
pub(crate) mod migrate;
pub(crate) mod pending;
#[cfg(feature = "serve")]
pub(crate) mod serve;
pub(crate) mod status;
