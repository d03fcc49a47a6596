//! Header assembly for outgoing requests.

use http::HeaderMap;
use http::header::{ACCEPT_LANGUAGE, HeaderName, HeaderValue};

use crate::error::RestError;

/// `Accept-Language` value used when the process locale is unknown or is
/// the POSIX locale: no language preference.
pub const ANY_LANGUAGE: &str = "*";

/// Locale environment variables, highest precedence first.
const LOCALE_VARS: [&str; 3] = ["LC_ALL", "LC_MESSAGES", "LANG"];

/// Convert a POSIX locale name (`de_DE.UTF-8@euro`) into a BCP 47 language
/// tag (`de-DE`). Returns `None` for the `C`/`POSIX` locales.
fn posix_to_language_tag(locale: &str) -> Option<String> {
    let tag = locale
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .trim();
    if tag.is_empty() || tag.eq_ignore_ascii_case("C") || tag.eq_ignore_ascii_case("POSIX") {
        return None;
    }
    Some(tag.replace('_', "-"))
}

/// Language tag of the current process locale.
///
/// The first non-empty of `LC_ALL`, `LC_MESSAGES` and `LANG` decides.
#[must_use]
pub fn current_language() -> String {
    LOCALE_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.trim().is_empty())
        .and_then(|locale| posix_to_language_tag(&locale))
        .unwrap_or_else(|| ANY_LANGUAGE.to_owned())
}

/// Merge caller headers into the outgoing request headers.
///
/// An `Accept-Language` header is added unless the caller supplies one.
/// A header already present on the request is never replaced or repeated,
/// so transport-level defaults win over caller values of the same name.
pub(crate) fn apply_headers(
    target: &mut HeaderMap,
    additional: &[(&str, &str)],
    accept_language: &HeaderValue,
) -> Result<(), RestError> {
    let mut merged = Vec::with_capacity(additional.len() + 1);
    for (name, value) in additional {
        merged.push((
            HeaderName::try_from(*name)?,
            HeaderValue::try_from(*value)?,
        ));
    }

    if !merged.iter().any(|(name, _)| name == ACCEPT_LANGUAGE) {
        merged.push((ACCEPT_LANGUAGE, accept_language.clone()));
    }

    for (name, value) in merged {
        if !target.contains_key(&name) {
            target.insert(name, value);
        }
    }
    Ok(())
}
