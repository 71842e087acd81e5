//! Helpers for root-relative, `/`-separated path keys.

use std::path::Path;

/// Root-relative key for `path`, or `None` when it lies outside `root`.
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let key = to_slash(rel);
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}

pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Trim `./` prefixes and surrounding slashes from a configured directory.
pub fn normalize_dir(raw: &str) -> String {
    let mut value = raw.trim().replace('\\', "/");
    while let Some(rest) = value.strip_prefix("./") {
        value = rest.to_string();
    }
    let value = value.trim_matches('/');
    if value == "." {
        return String::new();
    }
    value.to_string()
}

/// True when `path` equals `prefix` or lives beneath it.
pub fn has_dir_prefix(path: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    if path == prefix {
        return true;
    }
    if !path.starts_with(prefix) {
        return false;
    }
    path.as_bytes().get(prefix.len()) == Some(&b'/')
}

pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Directory part of a key; empty for top-level files.
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Drop the final extension of the last segment (`a/b.test.ts` → `a/b.test`).
pub fn strip_extension(path: &str) -> &str {
    let name_start = path.rfind('/').map(|idx| idx + 1).unwrap_or(0);
    match path[name_start..].rfind('.') {
        Some(0) | None => path,
        Some(dot) => &path[..name_start + dot],
    }
}

pub fn extension(path: &str) -> Option<&str> {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(dot) => Some(&name[dot + 1..]),
    }
}

/// Base name without its final extension.
pub fn file_stem(path: &str) -> &str {
    strip_extension(file_name(path))
}

/// Join `spec` onto `base_dir`, folding `.` and `..` segments. Segments that
/// climb above the root are dropped.
pub fn join_relative(base_dir: &str, spec: &str) -> String {
    let mut parts: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in spec.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn dir_prefix_respects_segment_boundaries() {
        assert!(has_dir_prefix("src/pages/api/users.ts", "src/pages/api"));
        assert!(has_dir_prefix("src/pages/api", "src/pages/api"));
        assert!(!has_dir_prefix("src/pages/apix/users.ts", "src/pages/api"));
        assert!(has_dir_prefix("anything", ""));
    }

    #[test]
    fn normalize_dir_trims_noise() {
        assert_eq!(normalize_dir("./src/app/"), "src/app");
        assert_eq!(normalize_dir(" src\\components "), "src/components");
        assert_eq!(normalize_dir("."), "");
    }

    #[test]
    fn extension_helpers_only_touch_last_segment() {
        assert_eq!(strip_extension("src/lib/a.b/index.ts"), "src/lib/a.b/index");
        assert_eq!(strip_extension("src/lib.d/readme"), "src/lib.d/readme");
        assert_eq!(strip_extension("tests/user.test.ts"), "tests/user.test");
        assert_eq!(file_stem("src/components/Button.tsx"), "Button");
        assert_eq!(extension("src/components/Button.tsx"), Some("tsx"));
        assert_eq!(extension(".env"), None);
    }

    #[test]
    fn join_relative_folds_dot_segments() {
        assert_eq!(join_relative("src/app/admin", "../lib/db"), "src/app/lib/db");
        assert_eq!(join_relative("src/app", "./page"), "src/app/page");
        assert_eq!(join_relative("", "../../x"), "x");
    }

    #[test]
    fn relative_key_uses_forward_slashes() {
        let root = PathBuf::from("/repo");
        let file = root.join("src").join("pages").join("api").join("a.ts");
        assert_eq!(
            relative_key(&root, &file).as_deref(),
            Some("src/pages/api/a.ts")
        );
        assert_eq!(relative_key(&root, &root), None);
        assert_eq!(relative_key(&root, Path::new("/other/a.ts")), None);
    }
}
