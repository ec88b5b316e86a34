//! ORM options, loadable from a TOML file.

use crate::{OrmError, OrmResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Fire-and-forget diagnostic sink.
pub type Logger = Arc<dyn Fn(&str) + Send + Sync>;

/// Options for [`crate::DocMap`].
#[derive(Clone, Serialize, Deserialize)]
pub struct Options {
    /// Database the excluded store driver connects to.
    #[serde(alias = "dbName")]
    pub db_name: String,
    /// Descriptor-table directories, relative to `base_dir`.
    #[serde(default, alias = "entitiesDirs")]
    pub entities_dirs: Vec<PathBuf>,
    /// Root for `entities_dirs`; the current directory when unset.
    #[serde(default, alias = "baseDir")]
    pub base_dir: Option<PathBuf>,
    #[serde(default = "default_client_url", alias = "clientUrl")]
    pub client_url: String,
    #[serde(skip)]
    pub logger: Option<Logger>,
}

fn default_client_url() -> String {
    "mongodb://localhost:27017".to_string()
}

impl Options {
    pub fn new(db_name: impl Into<String>) -> Self {
        Self {
            db_name: db_name.into(),
            entities_dirs: Vec::new(),
            base_dir: None,
            client_url: default_client_url(),
            logger: None,
        }
    }

    /// Loads options from a TOML file.
    pub fn load_from(path: impl AsRef<Path>) -> OrmResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let options: Options = toml::from_str(&contents)?;
        info!("Loaded ORM options from {:?}", path);
        Ok(options)
    }

    #[must_use]
    pub fn with_entities_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.entities_dirs.push(dir.into());
        self
    }

    #[must_use]
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_client_url(mut self, url: impl Into<String>) -> Self {
        self.client_url = url.into();
        self
    }

    #[must_use]
    pub fn with_logger(mut self, logger: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    /// Checks required fields.
    pub fn validate(&self) -> OrmResult<()> {
        if self.db_name.trim().is_empty() {
            return Err(OrmError::Config(
                "no database specified, please fill in `db_name`".to_string(),
            ));
        }
        if self.client_url.trim().is_empty() {
            return Err(OrmError::Config("`client_url` must not be empty".to_string()));
        }
        Ok(())
    }

    /// `base_dir`, or the current directory.
    pub fn resolved_base_dir(&self) -> OrmResult<PathBuf> {
        match &self.base_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }

    /// Sends `message` to the configured logger; no-op without one.
    pub fn log(&self, message: &str) {
        if let Some(logger) = &self.logger {
            logger(message);
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("db_name", &self.db_name)
            .field("entities_dirs", &self.entities_dirs)
            .field("base_dir", &self.base_dir)
            .field("client_url", &self.client_url)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}
