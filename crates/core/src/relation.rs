//! Resolution of "attach by id or inline body" inputs.

use crate::error::CoreError;
use crate::types::ResourceKey;

/// Where an attached row comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum AttachSource<T> {
    /// An existing row, addressed by id or UUID.
    Existing(ResourceKey),
    /// A row described inline, to be fetched or created.
    Inline(T),
}

/// Exactly one of `key` or `inline` must be given.
///
/// `what` names the attached entity in error messages, e.g. `"creator"`.
pub fn resolve_attach<T>(
    what: &str,
    key: Option<&str>,
    inline: Option<T>,
) -> Result<AttachSource<T>, CoreError> {
    match (key, inline) {
        (Some(_), Some(_)) => Err(CoreError::Validation(format!(
            "Only one of {what}_id or {what} should be provided."
        ))),
        (None, None) => Err(CoreError::Validation(format!(
            "Either {what}_id or {what} must be provided."
        ))),
        (Some(raw), None) => ResourceKey::parse(raw).map(AttachSource::Existing),
        (None, Some(body)) => Ok(AttachSource::Inline(body)),
    }
}
