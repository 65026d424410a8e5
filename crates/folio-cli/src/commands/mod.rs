//! Command handlers.

pub(crate) mod plan;
pub(crate) mod replay;
