//! Credential cookie derivation and capture.
//!
//! Pure logic for both halves of the pipeline: building the outbound `Cookie`
//! header from vault state, and applying inbound `Set-Cookie` directives back
//! to the vault. Only the two recognized credential names are ever touched;
//! everything else a server sends is ignored.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};
use yomu_vault::{VaultHandle, keys};

/// `Expires` attributes arrive as IMF-fixdate, e.g.
/// `Thu, 21 Oct 2027 07:28:00 GMT`.
const HTTP_DATE: &[BorrowedFormatItem<'static>] = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

pub(crate) fn epoch_millis(datetime: OffsetDateTime) -> i64 {
    (datetime.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Build the outbound `Cookie` header value.
///
/// The session token is included verbatim whenever present. The stored
/// remember token is decoded from its `value;expiresAtEpochMillis` form and
/// included only while unexpired; an expired token is silently omitted, not
/// deleted (lazy invalidation — the server reissues or invalidates it).
///
/// Returns `None` when neither credential is usable, so anonymous requests
/// carry no header at all.
pub fn header(session: Option<&str>, remember: Option<&str>, now: OffsetDateTime) -> Option<String> {
    let mut pairs = Vec::new();
    if let Some(token) = session.filter(|token| !token.is_empty()) {
        pairs.push(format!("{}={token}", keys::SESSION));
    }
    if let Some(token) = remember.and_then(|stored| remember_cookie(stored, now)) {
        pairs.push(format!("{}={token}", keys::REMEMBER));
    }
    match pairs.is_empty() {
        true => None,
        false => Some(pairs.join(";")),
    }
}

/// Decode the persisted remember token, `None` when expired or empty.
///
/// A stored value without the `;expiry` suffix has no known expiry and is
/// treated as still valid. That mirrors the server never sending an
/// `Expires` attribute; if a bounded default TTL is ever wanted, this is
/// the single place to apply it.
fn remember_cookie(stored: &str, now: OffsetDateTime) -> Option<String> {
    match stored.split_once(';') {
        Some((value, expiry)) => {
            let expiry: i64 = expiry.trim().parse().ok()?;
            (expiry >= epoch_millis(now)).then(|| value.to_string())
        },
        None if !stored.is_empty() => Some(stored.to_string()),
        None => None,
    }
}

/// Split a packed `Set-Cookie` value into individual directives.
///
/// Some transports collapse multiple `Set-Cookie` headers into one
/// comma-joined value. A comma is also legal inside an `Expires` attribute,
/// so the split only happens immediately before a recognized credential
/// name.
pub fn split_packed(raw: &str) -> Vec<&str> {
    let mut directives = Vec::new();
    let mut start = 0;
    for (idx, _) in raw.match_indices(", ") {
        if idx < start {
            continue;
        }
        let rest = &raw[idx + 2..];
        if rest.starts_with(keys::SESSION) || rest.starts_with(keys::REMEMBER) {
            directives.push(raw[start..idx].trim());
            start = idx + 2;
        }
    }
    directives.push(raw[start..].trim());
    directives
}

/// Apply the `Set-Cookie` values of one response to the vault.
///
/// A single header value may be packed (see [`split_packed`]); multiple
/// header values are already split by the transport. Malformed directives
/// are skipped with a warning — one bad directive must never drop the valid
/// ones around it.
pub async fn absorb(vault: &VaultHandle, set_cookie_values: &[&str]) -> Result<()> {
    let directives: Vec<&str> = match set_cookie_values {
        [single] => split_packed(single),
        many => many.to_vec(),
    };
    for directive in directives {
        apply(vault, directive).await?;
    }
    Ok(())
}

/// Apply one credential-setting directive to the vault.
async fn apply(vault: &VaultHandle, directive: &str) -> Result<()> {
    let mut parts = directive.split(';').map(str::trim);
    let Some(pair) = parts.next() else {
        return Ok(());
    };
    let Some((name, value)) = pair.split_once('=') else {
        tracing::warn!(directive = pair, "skipping malformed credential directive");
        return Ok(());
    };
    if name != keys::SESSION && name != keys::REMEMBER {
        return Ok(());
    }
    if value.is_empty() {
        // Server-initiated invalidation.
        vault.delete(name).await.or_raise(|| ErrorKind::Vault)?;
        tracing::debug!(name, "credential invalidated by server");
        return Ok(());
    }
    let stored = match name {
        keys::REMEMBER => match parts.find_map(|attr| attr.strip_prefix("Expires=")) {
            Some(raw_date) => match parse_expires(raw_date) {
                Some(millis) => format!("{value};{millis}"),
                None => {
                    tracing::warn!(raw_date, "unparseable Expires attribute; storing token without expiry");
                    value.to_string()
                },
            },
            None => value.to_string(),
        },
        _ => value.to_string(),
    };
    vault.set(name, &stored).await.or_raise(|| ErrorKind::Vault)
}

/// Parse an HTTP-date into epoch milliseconds, `None` on malformed input.
fn parse_expires(raw: &str) -> Option<i64> {
    let parsed = PrimitiveDateTime::parse(raw.trim(), &HTTP_DATE).ok()?;
    Some(epoch_millis(parsed.assume_utc()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::Arc;
    use time::Duration;
    use yomu_vault::{CredentialVault, MemoryVault};

    fn vault_with(entries: &[(&str, &str)]) -> VaultHandle {
        Arc::new(MemoryVault::with_entries(entries.iter().copied()))
    }

    fn future_millis(now: OffsetDateTime, seconds: i64) -> String {
        epoch_millis(now + Duration::seconds(seconds)).to_string()
    }

    #[test]
    fn test_header_with_session_only() {
        let now = OffsetDateTime::now_utc();
        assert_eq!(
            header(Some("abc"), None, now).as_deref(),
            Some("KOMGA-SESSION=abc"),
        );
    }

    #[test]
    fn test_header_with_both_tokens() {
        let now = OffsetDateTime::now_utc();
        let remember = format!("xyz;{}", future_millis(now, 3600));
        assert_eq!(
            header(Some("abc"), Some(&remember), now).as_deref(),
            Some("KOMGA-SESSION=abc;komga-remember-me=xyz"),
        );
    }

    #[test]
    fn test_header_omits_expired_remember_token() {
        let now = OffsetDateTime::now_utc();
        let remember = format!("xyz;{}", future_millis(now, -1));
        assert_eq!(header(None, Some(&remember), now), None);
        assert_eq!(
            header(Some("abc"), Some(&remember), now).as_deref(),
            Some("KOMGA-SESSION=abc"),
        );
    }

    #[test]
    fn test_header_expiry_boundary_is_inclusive() {
        let now = OffsetDateTime::now_utc();
        let remember = format!("xyz;{}", epoch_millis(now));
        assert_eq!(
            header(None, Some(&remember), now).as_deref(),
            Some("komga-remember-me=xyz"),
        );
    }

    #[test]
    fn test_header_remember_without_expiry_is_included() {
        let now = OffsetDateTime::now_utc();
        assert_eq!(
            header(None, Some("xyz"), now).as_deref(),
            Some("komga-remember-me=xyz"),
        );
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some(""), None)]
    #[case(Some(""), Some(""))]
    fn test_header_absent_when_no_usable_credential(
        #[case] session: Option<&str>,
        #[case] remember: Option<&str>,
    ) {
        assert_eq!(header(session, remember, OffsetDateTime::now_utc()), None);
    }

    #[test]
    fn test_header_garbage_expiry_is_omitted() {
        let now = OffsetDateTime::now_utc();
        assert_eq!(header(None, Some("xyz;not-a-number"), now), None);
    }

    #[test]
    fn test_split_packed_on_recognized_names() {
        let packed = "KOMGA-SESSION=abc; Path=/; HttpOnly, komga-remember-me=xyz; \
                      Expires=Thu, 21 Oct 2027 07:28:00 GMT; Path=/";
        let directives = split_packed(packed);
        assert_eq!(directives.len(), 2);
        assert!(directives[0].starts_with("KOMGA-SESSION=abc"));
        assert!(directives[1].starts_with("komga-remember-me=xyz"));
        // The comma inside the Expires date does not split.
        assert!(directives[1].contains("21 Oct 2027"));
    }

    #[test]
    fn test_split_packed_single_directive_untouched() {
        let raw = "KOMGA-SESSION=abc; Path=/";
        assert_eq!(split_packed(raw), vec![raw]);
    }

    #[test]
    fn test_parse_expires() {
        let millis = parse_expires("Thu, 21 Oct 2027 07:28:00 GMT").unwrap();
        let parsed = OffsetDateTime::from_unix_timestamp(millis / 1000).unwrap();
        assert_eq!(parsed.year(), 2027);
        assert_eq!(parsed.hour(), 7);
        assert!(parse_expires("next Tuesday").is_none());
        assert!(parse_expires("").is_none());
    }

    #[tokio::test]
    async fn test_absorb_packed_directives_with_expiry() {
        let vault = vault_with(&[]);
        let now = OffsetDateTime::now_utc();
        let expires = (now + Duration::hours(1)).format(&HTTP_DATE).unwrap();
        let packed = format!(
            "KOMGA-SESSION=sess-1; Path=/; HttpOnly, komga-remember-me=rem-1; Expires={expires}; Path=/"
        );
        absorb(&vault, &[&packed]).await.unwrap();

        assert_eq!(vault.get(keys::SESSION).await.unwrap().as_deref(), Some("sess-1"));
        let stored = vault.get(keys::REMEMBER).await.unwrap().unwrap();
        let (value, expiry) = stored.split_once(';').unwrap();
        assert_eq!(value, "rem-1");
        let expiry: i64 = expiry.parse().unwrap();
        let expected = epoch_millis(now) + 3_600_000;
        // The formatted date truncates sub-second precision.
        assert!((expiry - expected).abs() <= 1_000, "expiry {expiry} vs expected {expected}");
    }

    #[tokio::test]
    async fn test_absorb_empty_value_deletes_credential() {
        let vault = vault_with(&[(keys::SESSION, "stale")]);
        absorb(&vault, &["KOMGA-SESSION=; Path=/; Max-Age=0"]).await.unwrap();
        assert_eq!(vault.get(keys::SESSION).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_absorb_ignores_unrecognized_names() {
        let vault = vault_with(&[]);
        absorb(&vault, &["XSRF-TOKEN=whatever; Path=/"]).await.unwrap();
        assert_eq!(vault.get("XSRF-TOKEN").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_absorb_malformed_directive_does_not_drop_valid_ones() {
        let vault = vault_with(&[]);
        absorb(&vault, &["garbage-without-equals", "KOMGA-SESSION=good"])
            .await
            .unwrap();
        assert_eq!(vault.get(keys::SESSION).await.unwrap().as_deref(), Some("good"));
    }

    #[tokio::test]
    async fn test_absorb_remember_without_expires_stores_raw_value() {
        let vault = vault_with(&[]);
        absorb(&vault, &["komga-remember-me=tok; Path=/; HttpOnly"]).await.unwrap();
        assert_eq!(vault.get(keys::REMEMBER).await.unwrap().as_deref(), Some("tok"));
    }
}
