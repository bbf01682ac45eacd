use std::collections::HashSet;

/// Patch headers that leave a file with new content. `*** Delete File:` is
/// not a write.
const WRITE_DIRECTIVES: [&str; 2] = ["*** Update File: ", "*** Add File: "];

/// Paths named by `*** Update File:` or `*** Add File:` directives, in
/// first-seen order.
pub fn extract_files_from_patch(patch: &str) -> Vec<String> {
    let mut files = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for line in patch.lines() {
        let Some(path) = WRITE_DIRECTIVES
            .iter()
            .find_map(|directive| line.strip_prefix(directive))
        else {
            continue;
        };
        let path = path.trim();
        if path.is_empty() {
            continue;
        }
        if seen.insert(path) {
            files.push(path.to_string());
        }
    }
    files
}
