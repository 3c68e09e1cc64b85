//! Lexical checks on change paths, before anything touches the filesystem.

use std::path::{Component, Path};

/// Name of the project control directory (config, ledger).
pub const CONTROL_DIR: &str = ".undoable";

/// Reason a change path is rejected without consulting the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexicalViolation {
    Empty,
    Absolute,
    ControlDir,
}

impl std::fmt::Display for LexicalViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            LexicalViolation::Empty => "path is empty",
            LexicalViolation::Absolute => "absolute paths are not allowed",
            LexicalViolation::ControlDir => "path targets the .undoable control directory",
        };
        f.write_str(msg)
    }
}

/// Reject paths that can never be valid change targets: empty, absolute
/// (including Windows drive/UNC prefixes), or inside the control directory.
pub fn check_relative(raw: &str) -> Result<&Path, LexicalViolation> {
    if raw.trim().is_empty() {
        return Err(LexicalViolation::Empty);
    }
    let path = Path::new(raw);
    if path.is_absolute() || looks_like_windows_absolute(raw) {
        return Err(LexicalViolation::Absolute);
    }
    let mut components = path
        .components()
        .filter(|component| !matches!(component, Component::CurDir));
    match components.next() {
        Some(Component::RootDir | Component::Prefix(_)) => Err(LexicalViolation::Absolute),
        Some(Component::Normal(first)) if first == CONTROL_DIR => {
            Err(LexicalViolation::ControlDir)
        }
        None => Err(LexicalViolation::Empty),
        _ => Ok(path),
    }
}

// `Path::is_absolute` follows the host platform; an LLM can emit either style.
fn looks_like_windows_absolute(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let drive = bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/');
    drive || raw.starts_with("\\\\") || raw.starts_with('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_nested_relative_paths() {
        assert!(check_relative("src/lib.rs").is_ok());
        assert!(check_relative("./README.md").is_ok());
        // `..` is resolved by the containment guard, not rejected lexically.
        assert!(check_relative("a/../b.txt").is_ok());
    }

    #[test]
    fn rejects_empty_and_dot_only() {
        assert_eq!(check_relative(""), Err(LexicalViolation::Empty));
        assert_eq!(check_relative("   "), Err(LexicalViolation::Empty));
        assert_eq!(check_relative("."), Err(LexicalViolation::Empty));
    }

    #[test]
    fn rejects_absolute_paths_in_any_style() {
        assert_eq!(check_relative("/etc/passwd"), Err(LexicalViolation::Absolute));
        assert_eq!(
            check_relative("C:\\Windows\\win.ini"),
            Err(LexicalViolation::Absolute)
        );
        assert_eq!(
            check_relative("\\\\server\\share"),
            Err(LexicalViolation::Absolute)
        );
    }

    #[test]
    fn rejects_control_directory() {
        assert_eq!(
            check_relative(".undoable/revert.json"),
            Err(LexicalViolation::ControlDir)
        );
        assert_eq!(
            check_relative("./.undoable/config.toml"),
            Err(LexicalViolation::ControlDir)
        );
        assert!(check_relative("docs/.undoable/notes.md").is_ok());
    }
}
