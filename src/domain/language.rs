use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static TAG_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]{2,3})[-_]([A-Za-z]{2})$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LanguageTag(String);

impl LanguageTag {
    pub fn parse(raw: &str) -> Option<Self> {
        let captures = TAG_SHAPE.captures(raw.trim())?;
        let primary = captures[1].to_ascii_lowercase();
        let region = captures[2].to_ascii_uppercase();
        Some(Self(format!("{primary}-{region}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
