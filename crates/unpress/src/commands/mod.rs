//! CLI command implementations.

mod convert;

pub(crate) use convert::ConvertArgs;
