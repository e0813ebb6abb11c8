// src/utils/validate.rs

use std::sync::LazyLock;

use regex::Regex;
use url::Url;
use validator::ValidationError;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{3,30}$").expect("username regex"));

/// Usernames: 3-30 chars, letters/digits/underscore. Stored lowercased.
pub fn username(value: &str) -> Result<(), ValidationError> {
    if USERNAME_RE.is_match(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("username");
        err.message = Some("Username must be 3-30 letters, digits or underscores".into());
        Err(err)
    }
}

/// Media fields carry URLs minted by the external media host; only
/// well-formed http(s) URLs are accepted.
pub fn media_url(value: &str) -> Result<(), ValidationError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => {
            let mut err = ValidationError::new("media_url");
            err.message = Some("Must be a well-formed http(s) URL".into());
            Err(err)
        }
    }
}
