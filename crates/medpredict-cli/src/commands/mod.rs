//! CLI command implementations

pub(crate) mod predict;
pub(crate) mod serve;
pub(crate) mod symptoms;
pub(crate) mod train;
