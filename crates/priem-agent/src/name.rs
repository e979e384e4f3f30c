use std::sync::LazyLock;

use regex::Regex;

/// "меня зовут <Name>": a single run of Cyrillic or Latin letters, any case.
static INTRODUCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)меня\s+зовут\s+([А-ЯЁа-яёA-Za-z]+)").expect("introduction pattern is valid")
});

/// Detect a self-introduction and return the name with its original casing.
pub fn extract_name(text: &str) -> Option<String> {
    INTRODUCTION
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
