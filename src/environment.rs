use std::path::PathBuf;
use std::sync::Arc;

use log::Logger;
use time::UtcOffset;

use crate::store::Store;

/// Everything a handler needs, cloned into each route.
#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub store: Arc<dyn Store>,
    pub config: Config,
}

impl Environment {
    pub fn new(logger: Arc<Logger>, store: Arc<dyn Store>, config: Config) -> Self {
        Self {
            logger,
            store,
            config,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    /// The offset used to render `recordedAt`.
    pub(crate) display_offset: UtcOffset,

    /// The directory the site is served from.
    pub(crate) site_root: PathBuf,
}

impl Config {
    pub fn new(display_offset: UtcOffset, site_root: impl Into<PathBuf>) -> Self {
        Self {
            display_offset,
            site_root: site_root.into(),
        }
    }

    pub fn site_root(&self) -> &PathBuf {
        &self.site_root
    }
}
