use regex::Regex;
use std::sync::LazyLock;

/// URLs longer than this are treated as suspicious.
pub const MAX_URL_LENGTH: usize = 75;

static DOMAIN_FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?([a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}(:[0-9]+)?(/.*)?$")
        .expect("domain format regex must compile")
});

/// True when the raw string is at most [`MAX_URL_LENGTH`] characters. No trimming.
///
/// Counts Unicode scalar values; a character outside the BMP counts once, not
/// as a UTF-16 surrogate pair.
pub fn check_url_length(url: &str) -> bool {
    url.chars().count() <= MAX_URL_LENGTH
}

/// True when `url` looks like `[scheme://]label.[label.]tld[:port][/path]`.
pub fn check_domain_validity(url: &str) -> bool {
    DOMAIN_FORMAT.is_match(url)
}
