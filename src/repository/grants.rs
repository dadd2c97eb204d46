//! Access grants for user-picked wallpaper resources

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GrantError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Grant for {0} could not be released")]
    NotReleased(String),
}

/// Long-lived read access to resources outside the catalog.
///
/// A wallpaper locator is only useful while its grant holds. Replacing or
/// clearing a wallpaper releases the grant for the previous locator.
pub trait ResourceGrants: Send + Sync {
    fn is_accessible(&self, locator: &str) -> bool;

    fn release(&self, locator: &str) -> Result<(), GrantError>;
}

/// Grants that are always held and never need releasing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGrants;

impl ResourceGrants for NoopGrants {
    fn is_accessible(&self, _locator: &str) -> bool {
        true
    }

    fn release(&self, _locator: &str) -> Result<(), GrantError> {
        Ok(())
    }
}

/// Local file locators (`file://` URLs or plain paths).
///
/// A file is accessible while it exists and is readable; releasing is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileGrants;

impl FileGrants {
    pub fn path_of(locator: &str) -> PathBuf {
        PathBuf::from(locator.strip_prefix("file://").unwrap_or(locator))
    }
}

impl ResourceGrants for FileGrants {
    fn is_accessible(&self, locator: &str) -> bool {
        std::fs::File::open(Self::path_of(locator)).is_ok()
    }

    fn release(&self, locator: &str) -> Result<(), GrantError> {
        log::debug!("grants: released {}", locator);
        Ok(())
    }
}
