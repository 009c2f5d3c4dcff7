//! Email obfuscation.

use crate::error::MalformedInputError;

const MASK: char = '*';

/// Mask the local part of `email`, keeping the first `reveal_length`
/// characters and the whole domain.
///
/// When `reveal_length` is at least the local part's length nothing is
/// masked and the address comes back unchanged.
pub fn obfuscate(email: &str, reveal_length: usize) -> Result<String, MalformedInputError> {
    let (local, domain) = email.split_once('@').ok_or(MalformedInputError)?;

    let local_len = local.chars().count();
    let mut out = String::with_capacity(email.len());
    out.extend(local.chars().take(reveal_length));
    out.extend(std::iter::repeat_n(MASK, local_len.saturating_sub(reveal_length)));
    out.push('@');
    out.push_str(domain);
    Ok(out)
}
