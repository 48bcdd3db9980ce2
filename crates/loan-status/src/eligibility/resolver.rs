use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use super::model::{ArtifactError, ModelArtifact, ModelHandle};

pub const DEFAULT_MODEL_NAMES: [&str; 2] = ["loan_staus_model", "loan_status_model"];
pub const DEFAULT_MODEL_EXTENSIONS: [&str; 4] = ["", ".sav", ".pkl", ".bin"];

/// Ordered lookup of a model artifact under several file name variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSearch {
    directory: PathBuf,
    names: Vec<String>,
    extensions: Vec<String>,
}

impl ModelSearch {
    pub fn new(directory: impl Into<PathBuf>, names: Vec<String>, extensions: Vec<String>) -> Self {
        Self {
            directory: directory.into(),
            names,
            extensions,
        }
    }

    /// Default candidate names and extensions, relative to `directory`.
    pub fn in_directory(directory: impl Into<PathBuf>) -> Self {
        Self::new(
            directory,
            DEFAULT_MODEL_NAMES.iter().map(|name| name.to_string()).collect(),
            DEFAULT_MODEL_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        )
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn primary_name(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }

    /// Paths in priority order: names are the outer loop, extensions the inner loop.
    pub fn candidates(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.names.iter().flat_map(move |name| {
            self.extensions
                .iter()
                .map(move |ext| self.directory.join(format!("{name}{ext}")))
        })
    }

    /// Loads the first candidate that exists.
    ///
    /// A missing file moves on to the next candidate. A file that exists but cannot be
    /// loaded stops the search and is reported, even if a later candidate would load.
    pub fn resolve(&self) -> Result<ModelHandle, ModelLoadError> {
        let mut tried = Vec::new();

        for path in self.candidates() {
            debug!(path = %path.display(), "probing model candidate");
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    tried.push(path);
                    continue;
                }
                Err(err) => return Err(broken(path, err.into())),
            };

            let handle = ModelArtifact::from_slice(&bytes)
                .and_then(|artifact| ModelHandle::from_artifact(artifact, &path));

            return match handle {
                Ok(handle) => {
                    info!(
                        model = %handle.name(),
                        path = %path.display(),
                        probabilities = handle.supports_probabilities(),
                        "model loaded"
                    );
                    Ok(handle)
                }
                Err(source) => Err(broken(path, source)),
            };
        }

        warn!(
            directory = %self.directory.display(),
            candidates = tried.len(),
            "no model artifact found"
        );
        Err(ModelLoadError::NotFound { tried })
    }
}

impl Default for ModelSearch {
    fn default() -> Self {
        Self::in_directory(".")
    }
}

fn broken(path: PathBuf, source: ArtifactError) -> ModelLoadError {
    error!(path = %path.display(), error = %source, "model artifact present but unusable");
    ModelLoadError::Broken { path, source }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("no model artifact found (tried {})", DisplayPaths(.tried))]
    NotFound { tried: Vec<PathBuf> },
    #[error("found {} but failed to load it: {source}", .path.display())]
    Broken {
        path: PathBuf,
        #[source]
        source: ArtifactError,
    },
}

impl ModelLoadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ModelLoadError::NotFound { .. })
    }
}

struct DisplayPaths<'a>(&'a [PathBuf]);

impl fmt::Display for DisplayPaths<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "no candidates");
        }
        for (index, path) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", path.display())?;
        }
        Ok(())
    }
}
