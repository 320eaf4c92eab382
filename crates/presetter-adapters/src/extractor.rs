//! Template extraction on top of the [`Filesystem`] port.
//!
//! Inputs are resolved against the template root:
//!
//! | Input               | Copies                                           |
//! |---------------------|--------------------------------------------------|
//! | `""`                | the whole template root                          |
//! | `"auth"` (dir)      | the contents of `auth/` into the destination     |
//! | `"index.php"`       | that single file                                 |
//! | `"*.php"`, `"a/?.md"` | matching files, keeping their relative path    |
//!
//! Wildcards never match across `/`.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use glob::{MatchOptions, Pattern};
use tracing::{debug, instrument};

use presetter_core::{
    application::{
        ApplicationError,
        ports::{ExtractRequest, Filesystem, TemplateExtractor},
    },
    domain::ConflictStrategy,
    error::PresetResult,
};

const DOTFILE_SUFFIX: &str = ".dotfile";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Copies template files through a [`Filesystem`].
#[derive(Clone)]
pub struct FilesystemExtractor {
    filesystem: Arc<dyn Filesystem>,
}

impl FilesystemExtractor {
    pub fn new(filesystem: Arc<dyn Filesystem>) -> Self {
        Self { filesystem }
    }

    /// Source → relative destination pairs for one input.
    fn select(
        &self,
        root: &Path,
        all_files: &[PathBuf],
        input: &str,
    ) -> PresetResult<Vec<(PathBuf, PathBuf)>> {
        let input = input.trim_matches('/');

        if input.is_empty() {
            return Ok(all_files
                .iter()
                .map(|f| (root.join(f), f.clone()))
                .collect());
        }

        if is_pattern(input) {
            let pattern = Pattern::new(input).map_err(|e| ApplicationError::FilesystemError {
                path: root.join(input),
                reason: format!("Invalid pattern: {e}"),
            })?;
            return Ok(all_files
                .iter()
                .filter(|f| pattern.matches_with(&to_slash(f), MATCH_OPTIONS))
                .map(|f| (root.join(f), f.clone()))
                .collect());
        }

        let source = root.join(input);
        if self.filesystem.is_dir(&source) {
            let prefix = Path::new(input);
            return Ok(all_files
                .iter()
                .filter_map(|f| f.strip_prefix(prefix).ok().map(|rel| (root.join(f), rel.to_path_buf())))
                .collect());
        }

        if self.filesystem.exists(&source) {
            let name = Path::new(input)
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(input));
            return Ok(vec![(source, name)]);
        }

        Err(ApplicationError::FilesystemError {
            path: source,
            reason: "Template entry does not exist".into(),
        }
        .into())
    }
}

impl std::fmt::Debug for FilesystemExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilesystemExtractor").finish_non_exhaustive()
    }
}

impl TemplateExtractor for FilesystemExtractor {
    #[instrument(skip_all, fields(root = %request.template_root.display()))]
    fn extract(&self, request: &ExtractRequest) -> PresetResult<Vec<PathBuf>> {
        let root = &request.template_root;
        if !self.filesystem.is_dir(root) {
            return Err(ApplicationError::FilesystemError {
                path: root.clone(),
                reason: "Template directory does not exist".into(),
            }
            .into());
        }

        let all_files = self.filesystem.list_files(root)?;
        let mut written = Vec::new();

        for input in &request.inputs {
            for (source, relative) in self.select(root, &all_files, input)? {
                let relative = if request.dotfiles {
                    rename_dotfiles(&relative)
                } else {
                    relative
                };
                let destination = request.destination.join(relative);

                if request.conflict == ConflictStrategy::Skip && self.filesystem.exists(&destination) {
                    debug!(path = %destination.display(), "Exists, skipping");
                    continue;
                }

                if let Some(parent) = destination.parent() {
                    self.filesystem.create_dir_all(parent)?;
                }
                let content = self.filesystem.read_file(&source)?;
                self.filesystem.write_file(&destination, &content)?;
                debug!(from = %source.display(), to = %destination.display(), "Copied");
                written.push(destination);
            }
        }

        Ok(written)
    }
}

fn is_pattern(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// `name.dotfile` → `.name`, for every path component.
fn rename_dotfiles(path: &Path) -> PathBuf {
    path.components()
        .map(|c| match c {
            Component::Normal(part) => {
                let part = part.to_string_lossy();
                match part.strip_suffix(DOTFILE_SUFFIX) {
                    Some(stem) if !stem.is_empty() => format!(".{stem}"),
                    _ => part.into_owned(),
                }
            }
            other => other.as_os_str().to_string_lossy().into_owned(),
        })
        .collect()
}
