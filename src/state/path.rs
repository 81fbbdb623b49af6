//! Path sanitization for the hierarchical store.

const EDGE_CHARS: &[char] = &['.', '$', '#', '[', ']', '/'];
const DISALLOWED: &[char] = &['.', '$', '#', '[', ']'];

/// Normalize a store path: strip edge punctuation, collapse repeated slashes,
/// drop leading dots per segment, and replace `. $ # [ ]` with `_`.
pub fn sanitize(path: &str) -> String {
    path.trim_matches(EDGE_CHARS)
        .split('/')
        .map(|segment| segment.trim_start_matches('.'))
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.replace(DISALLOWED, "_"))
        .collect::<Vec<_>>()
        .join("/")
}

/// Join a base path and a child key with a single slash.
pub fn join(base: &str, key: &str) -> String {
    if base.is_empty() {
        key.to_string()
    } else {
        format!("{base}/{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_edges_and_collapses_slashes() {
        assert_eq!(sanitize("/h2h//m1/"), "h2h/m1");
        assert_eq!(sanitize("$health/h2h#"), "health/h2h");
    }

    #[test]
    fn replaces_disallowed_characters() {
        assert_eq!(sanitize("team_stats/a.b$c#d[e]"), "team_stats/a_b_c_d_e");
        assert_eq!(sanitize("team_stats/[x]y"), "team_stats/_x_y");
    }

    #[test]
    fn drops_leading_dots_per_segment() {
        assert_eq!(sanitize("matches/.hidden/..m1"), "matches/hidden/m1");
    }

    #[test]
    fn keeps_dates_intact() {
        assert_eq!(sanitize("matches/2026-10-20/4411"), "matches/2026-10-20/4411");
    }

    #[test]
    fn empty_path_is_root() {
        assert_eq!(sanitize("//"), "");
        assert_eq!(join("", "h2h"), "h2h");
        assert_eq!(join("h2h", "m1"), "h2h/m1");
    }
}
