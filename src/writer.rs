use crate::error::IngestError;
use log::{debug, error, info, warn};
use regex::Regex;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const MAX_FILENAME_CHARS: usize = 200;
const FALLBACK_FILENAME: &str = "untitled_recipe";
const EXTENSION: &str = "md";

static INVALID_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Persistence collaborator for rendered recipes, keyed by title
pub trait RecipeStore: Send + Sync {
    /// Where the document for `title` lives (or would live)
    fn path_for(&self, title: &str) -> PathBuf;

    /// Whether a document for `title` already exists
    fn exists(&self, title: &str) -> bool;

    /// Current content of the document for `title`
    fn read(&self, title: &str) -> Result<String, IngestError>;

    /// Persist `content` for `title`.
    ///
    /// Without `overwrite` an existing document is never replaced and
    /// [`IngestError::DuplicateExists`] is returned instead.
    fn write(&self, title: &str, content: &str, overwrite: bool) -> Result<PathBuf, IngestError>;
}

/// Turn a recipe title into a safe file stem (without extension).
///
/// The result is never empty and at most 200 characters long.
pub fn sanitize_filename(title: &str) -> String {
    let sanitized = INVALID_FILENAME_CHARS.replace_all(title, "");
    let sanitized = WHITESPACE.replace_all(&sanitized, " ");
    let sanitized = sanitized.trim();

    let sanitized = match sanitized.char_indices().nth(MAX_FILENAME_CHARS) {
        Some((idx, _)) => sanitized[..idx].trim_end(),
        None => sanitized,
    };

    let sanitized = if sanitized.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        sanitized.to_string()
    };
    debug!("Sanitized '{}' to '{}'", title, sanitized);
    sanitized
}

/// Writes recipe documents into a directory of an Obsidian-style vault
#[derive(Debug, Clone)]
pub struct VaultWriter {
    recipes_dir: PathBuf,
}

impl VaultWriter {
    /// Use `recipes_dir` inside `vault_path`.
    ///
    /// The vault root must already exist. The recipes directory is created on the
    /// first write, so opening a vault never touches the disk.
    pub fn new(vault_path: impl AsRef<Path>, recipes_dir: &str) -> Result<Self, IngestError> {
        let vault_path = vault_path.as_ref();
        if !vault_path.is_dir() {
            return Err(IngestError::InvalidVault(vault_path.to_path_buf()));
        }

        let recipes_dir = vault_path.join(recipes_dir);
        info!("Vault writer initialized: {}", recipes_dir.display());
        Ok(Self { recipes_dir })
    }

    pub fn recipes_dir(&self) -> &Path {
        &self.recipes_dir
    }

    /// Write to a temp file in the target directory, fsync, then rename into place.
    fn write_atomic(&self, path: &Path, content: &str, overwrite: bool) -> io::Result<()> {
        let mut temp = tempfile::Builder::new()
            .prefix(".tmp_")
            .suffix(".md")
            .tempfile_in(&self.recipes_dir)?;

        temp.write_all(content.as_bytes())?;
        temp.flush()?;
        temp.as_file().sync_all()?;

        // A failed persist hands the temp file back; dropping it removes it from disk
        if overwrite {
            temp.persist(path).map_err(|e| e.error)?;
        } else {
            temp.persist_noclobber(path).map_err(|e| e.error)?;
        }
        Ok(())
    }
}

impl RecipeStore for VaultWriter {
    fn path_for(&self, title: &str) -> PathBuf {
        self.recipes_dir
            .join(format!("{}.{}", sanitize_filename(title), EXTENSION))
    }

    fn exists(&self, title: &str) -> bool {
        let path = self.path_for(title);
        let exists = path.exists();
        if exists {
            debug!("Duplicate found: {}", path.display());
        }
        exists
    }

    fn read(&self, title: &str) -> Result<String, IngestError> {
        let path = self.path_for(title);
        fs::read_to_string(&path).map_err(|source| IngestError::Persistence { path, source })
    }

    fn write(&self, title: &str, content: &str, overwrite: bool) -> Result<PathBuf, IngestError> {
        let path = self.path_for(title);

        if !overwrite && path.exists() {
            warn!("Recipe already exists: {}", path.display());
            return Err(IngestError::DuplicateExists {
                title: title.to_string(),
                path,
            });
        }

        fs::create_dir_all(&self.recipes_dir).map_err(|source| IngestError::Persistence {
            path: self.recipes_dir.clone(),
            source,
        })?;

        info!("Writing recipe to: {}", path.display());
        match self.write_atomic(&path, content, overwrite) {
            Ok(()) => {
                info!("Successfully wrote recipe: {}", path.display());
                Ok(path)
            }
            // Someone else created the file after the existence check
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && !overwrite => {
                warn!("Recipe appeared while writing: {}", path.display());
                Err(IngestError::DuplicateExists {
                    title: title.to_string(),
                    path,
                })
            }
            Err(source) => {
                error!("Failed to write recipe: {}", source);
                Err(IngestError::Persistence { path, source })
            }
        }
    }
}
