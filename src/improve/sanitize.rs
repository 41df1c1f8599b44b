//! Strip the preamble models like to put in front of the answer.

use regex::Regex;
use std::sync::LazyLock;

/// Specific preambles, tried in order.
static STANDARD_PREFIXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\AHere['’]s the improved text:\s*",
        r"(?i)\AImproved text:\s*",
        r"(?i)\AHere is the improved version:\s*",
        r"(?i)\AThe improved text is:\s*",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Catch-all for any one-line "Here ...:" lead-in.
static GENERIC_HERE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\AHere[^:\n]*:\s*").unwrap());

/// Ordered prefix-strip rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseSanitizer {
    /// Only the known preambles.
    #[default]
    Standard,
    /// Known preambles, then any leading "Here …:" line.
    Lenient,
}

impl ResponseSanitizer {
    /// Clean a raw model response.
    ///
    /// Each rule removes at most its own leading match; the result is
    /// trimmed. `None` yields an empty string.
    pub fn sanitize(self, raw: Option<&str>, _original: &str) -> String {
        let Some(raw) = raw else {
            return String::new();
        };

        let mut text = raw.trim_start().to_string();
        for pattern in STANDARD_PREFIXES.iter() {
            text = pattern.replace(&text, "").into_owned();
        }
        if self == Self::Lenient {
            text = GENERIC_HERE_PREFIX.replace(&text, "").into_owned();
        }
        text.trim().to_string()
    }
}
