//! Callback URL validation.
//!
//! Callbacks may only target hosts under the trusted platform suffix, with a
//! configuration escape hatch for `localhost` in local development.

use url::Url;

/// Domain suffix callback hosts must live under.
pub const TRUSTED_HOST_SUFFIX: &str = ".mdtp";

/// Why a callback URL was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackUrlError {
    /// Not a syntactically valid absolute http(s) URL.
    Invalid,
    /// Valid URL, but the host is outside the trusted domain.
    InvalidHost,
}

impl CallbackUrlError {
    /// Field-level error code surfaced to submitting clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Invalid => "callbackUrl.invalid",
            Self::InvalidHost => "callbackUrl.invalidHost",
        }
    }
}

impl std::fmt::Display for CallbackUrlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Validate a callback URL, returning the parsed form on success.
pub fn validate_callback_url(raw: &str, allow_localhost: bool) -> Result<Url, CallbackUrlError> {
    let url = Url::parse(raw).map_err(|_| CallbackUrlError::Invalid)?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(CallbackUrlError::Invalid);
    }

    let host = url.host_str().ok_or(CallbackUrlError::Invalid)?;
    if host.ends_with(TRUSTED_HOST_SUFFIX) || (allow_localhost && host == "localhost") {
        Ok(url)
    } else {
        Err(CallbackUrlError::InvalidHost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_trusted_platform_hosts() {
        let url = validate_callback_url("http://foo.mdtp/x", false).unwrap();
        assert_eq!(url.host_str(), Some("foo.mdtp"));

        validate_callback_url("https://callback.protected.mdtp/notify", false).unwrap();
    }

    #[test]
    fn rejects_hosts_outside_the_platform() {
        assert_eq!(
            validate_callback_url("http://foo.com/x", false),
            Err(CallbackUrlError::InvalidHost)
        );
        // Bare "mdtp" is not under the suffix.
        assert_eq!(
            validate_callback_url("http://mdtp/x", false),
            Err(CallbackUrlError::InvalidHost)
        );
    }

    #[test]
    fn localhost_is_gated_by_configuration() {
        assert_eq!(
            validate_callback_url("http://localhost/x", false),
            Err(CallbackUrlError::InvalidHost)
        );
        validate_callback_url("http://localhost/x", true).unwrap();
        validate_callback_url("http://localhost:9000/cb", true).unwrap();
    }

    #[test]
    fn rejects_garbage_and_non_http_schemes() {
        assert_eq!(
            validate_callback_url("foobar", false),
            Err(CallbackUrlError::Invalid)
        );
        assert_eq!(
            validate_callback_url("ftp://foo.mdtp/x", true),
            Err(CallbackUrlError::Invalid)
        );
    }

    #[test]
    fn error_codes_match_the_wire_contract() {
        assert_eq!(CallbackUrlError::Invalid.code(), "callbackUrl.invalid");
        assert_eq!(CallbackUrlError::InvalidHost.code(), "callbackUrl.invalidHost");
    }
}
