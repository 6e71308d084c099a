//! Path sandboxing for the graph root.
//!
//! Every file-touching operation calls through [`resolve_in_root`] before
//! doing I/O. The resolver bounds any caller-supplied relative path to the
//! graph root, defeating `..` traversal, symlink escapes, and case-folding
//! tricks across operating systems. It is a read-only check with no side
//! effects.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::errors::ArborError;

/// Whether path comparison folds case on this platform.
///
/// macOS (APFS/HFS+) and Windows (NTFS) fold case by default; everything
/// else is compared byte-for-byte.
const FOLD_CASE: bool = cfg!(any(target_os = "macos", target_os = "windows"));

/// Resolve a caller-supplied path against a graph root.
///
/// The input is joined onto `root`, normalized lexically (collapsing `.` and
/// `..`), then canonicalized against the real filesystem so that symlinks
/// resolve to their final target. For a path that does not exist yet (a file
/// about to be created), the deepest existing ancestor is canonicalized and
/// the remainder re-appended.
///
/// # Arguments
///
/// * `root` - The graph root. Must exist.
/// * `user_path` - Untrusted caller input, normally relative.
///
/// # Errors
///
/// Returns [`ArborError::PathTraversal`] if the input contains control
/// characters, carries a drive-letter or UNC prefix, or resolves anywhere
/// outside `root`.
pub fn resolve_in_root(root: &Path, user_path: &str) -> Result<PathBuf, ArborError> {
    // Control characters (including NUL) never appear in legitimate node
    // names and can smuggle separators past naive checks.
    if user_path.chars().any(char::is_control) {
        return Err(ArborError::traversal(user_path));
    }

    // Drive-letter switches ("C:...") and UNC prefixes ("\\server\...",
    // "//server/...") bypass prefix comparison entirely, so they are
    // rejected on every platform rather than bounds-checked.
    if has_drive_or_unc_prefix(user_path) {
        return Err(ArborError::traversal(user_path));
    }

    let canonical_root = root.canonicalize()?;

    let joined = canonical_root.join(user_path);
    let normalized = normalize_lexically(&joined);

    let candidate = canonicalize_allowing_missing(&normalized)?;

    if !is_same_or_descendant(&candidate, &canonical_root) {
        return Err(ArborError::traversal(user_path));
    }

    Ok(candidate)
}

/// Check for Windows drive-letter or UNC-style prefixes.
///
/// Checked textually so the rejection is unconditional: on Unix a path like
/// `C:\x` would otherwise be treated as an ordinary relative file name and
/// round-trip through the prefix check unharmed.
fn has_drive_or_unc_prefix(input: &str) -> bool {
    let bytes = input.as_bytes();

    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return true;
    }

    input.starts_with("\\\\") || input.starts_with("//")
}

/// Collapse `.` and `..` components without touching the filesystem.
///
/// `..` at the top of the path (nothing left to pop) is dropped; the result
/// then falls outside the root and is rejected by the prefix comparison.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(seg) => out.push(seg),
        }
    }

    out
}

/// Canonicalize a path, tolerating a missing suffix.
///
/// If the path does not exist, the deepest existing ancestor is
/// canonicalized (resolving symlinks) and the missing remainder re-appended
/// verbatim. The remainder contains no `.`/`..` components because the
/// caller normalizes first.
fn canonicalize_allowing_missing(path: &Path) -> io::Result<PathBuf> {
    let mut missing: Vec<std::ffi::OsString> = Vec::new();
    let mut current: &Path = path;

    loop {
        match current.canonicalize() {
            Ok(base) => {
                let mut out = base;
                for seg in missing.iter().rev() {
                    out.push(seg);
                }
                return Ok(out);
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let Some(parent) = current.parent() else {
                    return Err(err);
                };
                let Some(name) = current.file_name() else {
                    return Err(err);
                };
                missing.push(name.to_os_string());
                current = parent;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Component-wise containment check: `candidate` equals `root` or lives
/// below it, folding case where the platform's filesystems do.
fn is_same_or_descendant(candidate: &Path, root: &Path) -> bool {
    let candidate: Vec<Component> = candidate.components().collect();
    let root: Vec<Component> = root.components().collect();

    if candidate.len() < root.len() {
        return false;
    }

    root.iter()
        .zip(candidate.iter())
        .all(|(r, c)| components_equal(r, c))
}

fn components_equal(a: &Component, b: &Component) -> bool {
    if FOLD_CASE {
        let a = a.as_os_str().to_string_lossy().to_lowercase();
        let b = b.as_os_str().to_string_lossy().to_lowercase();
        a == b
    } else {
        a.as_os_str() == b.as_os_str()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn root() -> TempDir {
        TempDir::new().expect("tempdir")
    }

    #[test]
    fn test_resolves_simple_relative_path() {
        let dir = root();
        let resolved = resolve_in_root(dir.path(), "pages/contact.md").unwrap();
        let canonical = dir.path().canonicalize().unwrap();
        assert!(resolved.starts_with(&canonical));
        assert!(resolved.ends_with("pages/contact.md"));
    }

    #[test]
    fn test_resolves_existing_file() {
        let dir = root();
        std::fs::write(dir.path().join("a.md"), "- hi").unwrap();
        let resolved = resolve_in_root(dir.path(), "a.md").unwrap();
        assert_eq!(std::fs::read_to_string(resolved).unwrap(), "- hi");
    }

    #[test]
    fn test_rejects_parent_escape() {
        let dir = root();
        let err = resolve_in_root(dir.path(), "../outside.md").unwrap_err();
        assert!(matches!(err, ArborError::PathTraversal { .. }));
    }

    #[test]
    fn test_rejects_deep_escape() {
        let dir = root();
        let err = resolve_in_root(dir.path(), "a/b/../../../../etc/passwd").unwrap_err();
        assert!(matches!(err, ArborError::PathTraversal { .. }));
    }

    #[test]
    fn test_inner_dotdot_stays_inside() {
        let dir = root();
        let resolved = resolve_in_root(dir.path(), "a/../b.md").unwrap();
        assert!(resolved.ends_with("b.md"));
        assert!(resolved.starts_with(dir.path().canonicalize().unwrap()));
    }

    #[test]
    fn test_rejects_null_byte() {
        let dir = root();
        let err = resolve_in_root(dir.path(), "a\0.md").unwrap_err();
        assert!(matches!(err, ArborError::PathTraversal { .. }));
    }

    #[test]
    fn test_rejects_control_characters() {
        let dir = root();
        assert!(resolve_in_root(dir.path(), "a\nb.md").is_err());
        assert!(resolve_in_root(dir.path(), "a\x1b.md").is_err());
    }

    #[test]
    fn test_rejects_drive_letter_prefix() {
        let dir = root();
        let err = resolve_in_root(dir.path(), "C:\\evil.md").unwrap_err();
        assert!(matches!(err, ArborError::PathTraversal { .. }));
        assert!(resolve_in_root(dir.path(), "c:relative.md").is_err());
    }

    #[test]
    fn test_rejects_unc_prefix() {
        let dir = root();
        assert!(resolve_in_root(dir.path(), "\\\\server\\share\\x.md").is_err());
        assert!(resolve_in_root(dir.path(), "//server/share/x.md").is_err());
    }

    #[test]
    fn test_root_itself_resolves() {
        let dir = root();
        let resolved = resolve_in_root(dir.path(), "").unwrap();
        assert_eq!(resolved, dir.path().canonicalize().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_rejects_symlink_escaping_root() {
        let dir = root();
        let outside = TempDir::new().unwrap();
        std::fs::write(outside.path().join("secret.md"), "secret").unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret.md"), dir.path().join("link.md"))
            .unwrap();

        // The link itself lives inside the root; its target does not.
        let err = resolve_in_root(dir.path(), "link.md").unwrap_err();
        assert!(matches!(err, ArborError::PathTraversal { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_accepts_symlink_staying_inside_root() {
        let dir = root();
        std::fs::write(dir.path().join("real.md"), "- body").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.md"), dir.path().join("alias.md"))
            .unwrap();

        let resolved = resolve_in_root(dir.path(), "alias.md").unwrap();
        assert!(resolved.ends_with("real.md"));
    }

    #[test]
    fn test_missing_nested_path_resolves_under_root() {
        let dir = root();
        let resolved = resolve_in_root(dir.path(), "journals/2025/06/07.md").unwrap();
        assert!(resolved.starts_with(dir.path().canonicalize().unwrap()));
        assert!(resolved.ends_with("journals/2025/06/07.md"));
    }
}
