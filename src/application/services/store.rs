//! Tree persistence service
//!
//! Loads the tree at session start and writes it back at session end.
//! The artifact is always overwritten as a whole.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::DecisionTree;
use crate::infrastructure::traits::{FileSystem, TreeCodec};

/// Reads and writes the persisted tree.
pub struct TreeStore {
    fs: Arc<dyn FileSystem>,
    codec: Arc<dyn TreeCodec>,
}

impl TreeStore {
    pub fn new(fs: Arc<dyn FileSystem>, codec: Arc<dyn TreeCodec>) -> Self {
        Self { fs, codec }
    }

    /// Load the tree from `path`, or `None` when there is no file yet.
    ///
    /// A file that exists but does not decode is an error.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<Option<DecisionTree>> {
        if !self.fs.exists(path) {
            return Ok(None);
        }
        let bytes = self.fs.read(path).with_path_context("read tree", path)?;
        debug!("read {} bytes", bytes.len());
        let tree = self
            .codec
            .decode(&bytes)
            .map_err(|source| ApplicationError::Persistence {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Some(tree))
    }

    /// Load the tree, starting a fresh `root` on first run.
    pub fn load_or_init(&self, path: &Path) -> ApplicationResult<DecisionTree> {
        match self.load(path)? {
            Some(tree) => {
                info!("loaded tree from {}", path.display());
                Ok(tree)
            }
            None => {
                info!("no tree at {}, starting fresh", path.display());
                Ok(DecisionTree::root())
            }
        }
    }

    /// Overwrite `path` with the encoded tree.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn save(&self, path: &Path, tree: &DecisionTree) -> ApplicationResult<()> {
        let bytes = self
            .codec
            .encode(tree)
            .map_err(|source| ApplicationError::Persistence {
                path: path.to_path_buf(),
                source,
            })?;
        self.fs
            .ensure_parent(path)
            .with_path_context("create directory for", path)?;
        self.fs
            .write(path, &bytes)
            .with_path_context("write tree", path)?;
        info!("saved tree to {}", path.display());
        Ok(())
    }
}
