use super::{Error, ErrorKind};
use crate::{compile::Key, region::Region};

/// Return an [`Error`] explaining that the write operation failed.
///
/// This is likely caused by a failure during a `write!` macro operation.
pub fn error_write() -> Error {
    Error::build(ErrorKind::Write)
        .with_help("failed to write result of render, are you low on memory?")
}

/// Return an [`Error`] describing a key that resolved to nothing.
pub fn error_context_miss(source: &str, key: &Key) -> Error {
    Error::build(ErrorKind::ContextMiss)
        .with_pointer(source, key.region)
        .with_help(format!(
            "cannot find `{key}` in any context, disable strict mode to render \
            missing values as empty"
        ))
}

/// Return an [`Error`] describing a partial that is not in the registry.
pub fn error_missing_partial(source: &str, name: &str, region: Region) -> Error {
    Error::build(ErrorKind::MissingPartial)
        .with_pointer(source, region)
        .with_help(format!(
            "partial `{name}` not found, register it before rendering"
        ))
}

/// Return an [`Error`] describing runaway partial recursion.
pub fn error_partial_depth(source: &str, name: &str, region: Region, max: usize) -> Error {
    Error::build(ErrorKind::MaxPartialDepth)
        .with_pointer(source, region)
        .with_help(format!(
            "partial `{name}` exceeded the maximum depth of {max}, does it include itself?"
        ))
}
