//! Selection masks: which entries of a change set a caller approved.

use std::collections::BTreeSet;
use std::path::{Component, Path};

use crate::core::types::FileChange;

/// Subset of a change set to apply. Unselected entries are reported as
/// `SKIPPED` and never touch the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// Every entry.
    #[default]
    All,
    /// Entries at one of `indices` (zero-based) or whose path is one of
    /// `paths`. Paths compare after lexical normalization, so `./src/a.rs`
    /// selects `src/a.rs`.
    Subset {
        indices: BTreeSet<usize>,
        paths: BTreeSet<String>,
    },
}

impl Selection {
    pub fn indices<I: IntoIterator<Item = usize>>(indices: I) -> Self {
        Selection::Subset {
            indices: indices.into_iter().collect(),
            paths: BTreeSet::new(),
        }
    }

    pub fn paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Selection::Subset {
            indices: BTreeSet::new(),
            paths: paths
                .into_iter()
                .map(|p| normalize_for_match(p.as_ref()))
                .collect(),
        }
    }

    /// Build a selection from CLI filters; no filters at all selects everything.
    pub fn from_filters(indices: &[usize], paths: &[String]) -> Self {
        if indices.is_empty() && paths.is_empty() {
            return Selection::All;
        }
        Selection::Subset {
            indices: indices.iter().copied().collect(),
            paths: paths.iter().map(|p| normalize_for_match(p)).collect(),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    pub fn is_selected(&self, index: usize, change: &FileChange) -> bool {
        match self {
            Selection::All => true,
            Selection::Subset { indices, paths } => {
                indices.contains(&index) || paths.contains(&normalize_for_match(&change.path))
            }
        }
    }
}

/// Lexical normalization used only for matching selection paths: drops `.`
/// segments, folds `\` into `/`. `..` is kept verbatim; containment is the
/// guard's job, not the selector's.
fn normalize_for_match(raw: &str) -> String {
    let unified = raw.replace('\\', "/");
    Path::new(&unified)
        .components()
        .filter_map(|component| match component {
            Component::CurDir => None,
            other => Some(other.as_os_str().to_string_lossy().into_owned()),
        })
        .collect::<Vec<_>>()
        .join("/")
}
