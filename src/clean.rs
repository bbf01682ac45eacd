const STREAM_SINKS: [&str; 3] = ["/dev/null", "/dev/stdout", "/dev/stderr"];

/// Turns a captured shell token into a file path, or rejects it.
///
/// Surrounding whitespace and quote characters are trimmed as one set, so
/// cleaning an already cleaned path returns it unchanged.
pub fn clean_path(raw: &str) -> Option<String> {
    let path = raw.trim_matches(|ch: char| ch.is_whitespace() || ch == '"' || ch == '\'');

    if path.is_empty()
        || path.starts_with("<<")
        || path.starts_with('-')
        || path.ends_with('/')
        || STREAM_SINKS.contains(&path)
    {
        return None;
    }

    Some(path.to_string())
}
