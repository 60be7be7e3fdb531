//! Output file naming
//!
//! The output name is the substring after the last `/` of the location,
//! joined onto the strategy's output directory. Nothing is escaped and no
//! uniqueness is enforced: two locations sharing a final segment map to the
//! same file and the later write wins.

use std::path::{Path, PathBuf};

use crate::errors::{FetchError, UnitResult};

/// Derives output paths inside one output directory
#[derive(Debug, Clone)]
pub struct ResourceNamer {
    output_dir: PathBuf,
}

impl ResourceNamer {
    /// Create a namer for the given output directory
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// The directory every derived path lives in
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Derive the output path for a location
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidLocation` when the location ends with `/`
    /// or is empty.
    pub fn name_for(&self, location: &str) -> UnitResult<PathBuf> {
        let segment = file_name_of(location).ok_or_else(|| FetchError::InvalidLocation {
            location: location.to_string(),
        })?;
        Ok(self.output_dir.join(segment))
    }
}

/// Final path segment of a location, if any
pub fn file_name_of(location: &str) -> Option<&str> {
    match location.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => Some(segment),
        _ => None,
    }
}
