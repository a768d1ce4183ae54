/// Chat usernames follow the `first.last` convention: the provider's
/// display name lowercased, with spaces turned into dots.
pub fn from_display_name(name: &str) -> String {
    name.to_lowercase().replace(' ', ".")
}

/// Splits a comma-separated username list, dropping blanks.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Order-preserving de-duplication.
pub fn unique(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !out.contains(name) {
            out.push(name.clone());
        }
    }
    out
}
