//! Badge images on disk.
//!
//! An artifact's path is a pure function of its token
//! (`<dir>/barcode_<token>.png`), so nothing needs to store it: preview and
//! export rebuild the path from the token alone.

use std::path::{Path, PathBuf};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use gympass_shared::constants::{ARTIFACT_EXTENSION, ARTIFACT_PREFIX};
use gympass_shared::symbol::{self, RenderOptions};

use crate::error::{GymError, Result};

/// The directory badge images are written to.
#[derive(Debug, Clone)]
pub struct ArtifactDir {
    root: PathBuf,
}

impl ArtifactDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the artifact for `token`.
    ///
    /// Tokens become file names, so anything that could escape the
    /// directory is refused.
    pub fn path_for(&self, token: &str) -> Result<PathBuf> {
        if token.is_empty()
            || token.contains('/')
            || token.contains('\\')
            || token.contains("..")
            || token.contains('\0')
        {
            return Err(GymError::InvalidInput(format!(
                "token {token:?} cannot be used as a file name"
            )));
        }
        Ok(self
            .root
            .join(format!("{ARTIFACT_PREFIX}{token}.{ARTIFACT_EXTENSION}")))
    }

    /// Create the directory if it does not exist yet.
    pub fn ensure(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }
}

/// Renders tokens as Code128 PNGs inside an [`ArtifactDir`].
#[derive(Debug, Clone)]
pub struct SymbolEncoder {
    dir: ArtifactDir,
    options: RenderOptions,
}

impl SymbolEncoder {
    pub fn new(dir: ArtifactDir, options: RenderOptions) -> Self {
        Self { dir, options }
    }

    pub fn dir(&self) -> &ArtifactDir {
        &self.dir
    }

    pub fn artifact_path(&self, token: &str) -> Result<PathBuf> {
        self.dir.path_for(token)
    }

    pub fn exists(&self, token: &str) -> bool {
        self.dir
            .path_for(token)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    /// Render `token` and write its artifact, overwriting any previous one.
    ///
    /// `label` is only used for logging.
    pub fn encode(&self, token: &str, label: Option<&str>) -> Result<PathBuf> {
        let path = self.dir.path_for(token)?;
        self.dir.ensure()?;
        symbol::write_png(token, &self.options, &path)?;

        info!(
            path = %path.display(),
            label = label.unwrap_or_default(),
            "Barcode image written"
        );
        Ok(path)
    }

    /// Run [`encode`](Self::encode) on the blocking pool.
    ///
    /// Dropping the handle abandons the result; the write still completes.
    pub fn encode_in_background(
        &self,
        token: String,
        label: Option<String>,
    ) -> JoinHandle<Result<PathBuf>> {
        let encoder = self.clone();
        tokio::task::spawn_blocking(move || encoder.encode(&token, label.as_deref()))
    }

    /// Copy an existing artifact to `dest`.
    pub fn export(&self, token: &str, dest: &Path) -> Result<PathBuf> {
        let src = self.dir.path_for(token)?;
        if !src.is_file() {
            return Err(GymError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no barcode image at {}", src.display()),
            )));
        }

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(&src, dest)?;

        info!(from = %src.display(), to = %dest.display(), "Barcode image exported");
        Ok(dest.to_path_buf())
    }

    /// Delete the artifact for `token`. Returns `false` if there was none.
    pub fn remove(&self, token: &str) -> Result<bool> {
        let path = self.dir.path_for(token)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "Barcode image removed");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to remove barcode image");
                Err(e.into())
            }
        }
    }
}
