//! GUID target path construction.

/// Build the path a GUID resolves to.
///
/// The base `url` is normalized to `/url/`, wrapped as `prefix + url + suffix`
/// and the result always ends with `/`.
pub fn build_guid_url(url: &str, prefix: Option<&str>, suffix: Option<&str>) -> String {
    let prefix = prefix.unwrap_or_default();
    let suffix = suffix.unwrap_or_default();

    let mut out = String::with_capacity(prefix.len() + url.len() + suffix.len() + 3);
    out.push_str(prefix);
    if !url.starts_with('/') {
        out.push('/');
    }
    out.push_str(url);
    if !url.ends_with('/') {
        out.push('/');
    }
    out.push_str(suffix);
    if !out.ends_with('/') {
        out.push('/');
    }
    out
}

/// The part of `request_path` before the first occurrence of `identifier`,
/// without trailing slashes. Empty for friendly routes.
pub fn request_prefix<'a>(request_path: &'a str, identifier: &str) -> &'a str {
    let head = match request_path.find(identifier) {
        Some(idx) => &request_path[..idx],
        None => request_path,
    };
    head.trim_end_matches('/')
}

/// The text of `path` after its first `segments` segments, left exactly as
/// received (percent-encoding intact). `None` when the path is shorter.
pub fn path_tail(path: &str, segments: usize) -> Option<&str> {
    let mut rest = path.strip_prefix('/')?;
    for _ in 0..segments {
        let idx = rest.find('/')?;
        rest = &rest[idx + 1..];
    }
    Some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slash_normalization() {
        assert_eq!(build_guid_url("abc", None, None), "/abc/");
        assert_eq!(build_guid_url("/abc", None, None), "/abc/");
        assert_eq!(build_guid_url("/abc/", None, None), "/abc/");
    }

    #[test]
    fn test_prefix_and_suffix() {
        assert_eq!(
            build_guid_url("/x", Some("/api/v1"), Some("comments")),
            "/api/v1/x/comments/"
        );
        assert_eq!(
            build_guid_url("/x/", Some("/api/v1"), Some("comments/")),
            "/api/v1/x/comments/"
        );
        assert_eq!(build_guid_url("x", Some(""), Some("")), "/x/");
    }

    #[test]
    fn test_suffix_kept_verbatim() {
        assert_eq!(
            build_guid_url("/project/abc12/", None, Some("wiki/home")),
            "/project/abc12/wiki/home/"
        );
    }

    #[test]
    fn test_request_prefix() {
        assert_eq!(request_prefix("/abc12/", "abc12"), "");
        assert_eq!(request_prefix("/abc12/files/", "abc12"), "");
        assert_eq!(request_prefix("/api/v1/abc12/", "abc12"), "/api/v1");
        assert_eq!(request_prefix("/api/v1//abc12", "abc12"), "/api/v1");
        // Only the first occurrence counts.
        assert_eq!(request_prefix("/abc12/abc12/", "abc12"), "");
    }

    #[test]
    fn test_request_prefix_without_identifier() {
        assert_eq!(request_prefix("/api/v1/other/", "abc12"), "/api/v1/other");
    }

    #[test]
    fn test_path_tail_keeps_encoding() {
        assert_eq!(path_tail("/abc12/wiki/", 1), Some("wiki/"));
        assert_eq!(path_tail("/api/v1/abc12/a%20b/", 3), Some("a%20b/"));
        assert_eq!(path_tail("/api/v1/abc12/a%3Fb%23c/", 3), Some("a%3Fb%23c/"));
        assert_eq!(path_tail("/abc12", 1), None);
        assert_eq!(path_tail("abc12/x", 1), None);
    }
}
