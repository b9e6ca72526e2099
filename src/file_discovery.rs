use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::warn;

use crate::cli::ContentKind;
use crate::config::FileConfig;

/// A file scheduled for validation and the validator that will see it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub kind: ContentKind,
}

/// Finds HTML and CSS files under the given paths
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    html_extensions: Vec<String>,
    css_extensions: Vec<String>,
    forced: Option<ContentKind>,
}

impl FileDiscovery {
    pub fn new(files: &FileConfig) -> Self {
        Self {
            html_extensions: files.html_extensions.clone(),
            css_extensions: files.css_extensions.clone(),
            forced: None,
        }
    }

    /// Send every explicitly named file to one validator
    pub fn with_kind(mut self, kind: Option<ContentKind>) -> Self {
        self.forced = kind;
        self
    }

    /// Classify a path by extension (case-insensitive)
    pub fn classify(&self, path: &Path) -> Option<ContentKind> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        if self.html_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
            Some(ContentKind::Html)
        } else if self.css_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
            Some(ContentKind::Css)
        } else {
            None
        }
    }

    /// Files named directly are always taken (using the forced kind when set);
    /// directories are walked honouring ignore files and keep only known
    /// extensions. Output is sorted and free of duplicates.
    pub fn discover(&self, paths: &[PathBuf]) -> Vec<DiscoveredFile> {
        let mut found = Vec::new();
        for path in paths {
            if path.is_file() {
                if let Some(kind) = self.forced.or_else(|| self.classify(path)) {
                    found.push(DiscoveredFile {
                        path: path.clone(),
                        kind,
                    });
                }
                continue;
            }

            for entry in WalkBuilder::new(path).build() {
                match entry {
                    Ok(entry) if entry.file_type().is_some_and(|t| t.is_file()) => {
                        let kind = match self.forced {
                            Some(forced) => self.classify(entry.path()).map(|_| forced),
                            None => self.classify(entry.path()),
                        };
                        if let Some(kind) = kind {
                            found.push(DiscoveredFile {
                                path: entry.into_path(),
                                kind,
                            });
                        }
                    }
                    Ok(_) => {}
                    Err(error) => warn!(path = %path.display(), %error, "skipping entry"),
                }
            }
        }
        found.sort_by(|a, b| a.path.cmp(&b.path));
        found.dedup_by(|a, b| a.path == b.path);
        found
    }
}
