// SPDX-License-Identifier: GPL-3.0-only

//! Shader sources and uniform parameters for the crunch pipelines
//!
//! The WGSL sources are not embedded in the binary. They are read once at
//! startup from a directory on disk, and a missing file is fatal.

pub mod params;

use crate::constants::shaders as names;
use crate::errors::ShaderError;
use std::path::{Path, PathBuf};
use tracing::info;

pub use params::{CrunchSettings, FrameParams, QuantTable, quant_cell};

/// WGSL source text of the three pipeline stages
#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
    pub compute: String,
    /// Directory the sources were read from
    pub directory: PathBuf,
}

impl ShaderSources {
    /// Read `vs.wgsl`, `fs.wgsl` and `cs.wgsl` from `directory`.
    pub fn load(directory: &Path) -> Result<Self, ShaderError> {
        let sources = Self {
            vertex: read_source(&directory.join(names::VERTEX_FILE))?,
            fragment: read_source(&directory.join(names::FRAGMENT_FILE))?,
            compute: read_source(&directory.join(names::COMPUTE_FILE))?,
            directory: directory.to_path_buf(),
        };
        info!(directory = %directory.display(), "Loaded shader sources");
        Ok(sources)
    }
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|err| ShaderError::NotFound {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Number of workgroups needed to cover `dimension` with tiles of `tile`.
#[inline]
pub fn compute_dispatch_size(dimension: u32, tile: u32) -> u32 {
    dimension.div_ceil(tile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_dispatch_size() {
        assert_eq!(compute_dispatch_size(1280, 16), 80);
        assert_eq!(compute_dispatch_size(1080, 16), 68);
        assert_eq!(compute_dispatch_size(16, 16), 1);
        assert_eq!(compute_dispatch_size(1, 16), 1);
    }

    #[test]
    fn test_missing_directory_names_file() {
        let err = ShaderSources::load(Path::new("/nonexistent/friedcamera-shaders"))
            .expect_err("directory does not exist");
        let ShaderError::NotFound { path, .. } = err;
        assert!(path.ends_with(names::VERTEX_FILE));
    }

    #[test]
    fn test_loads_bundled_shaders() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join(names::DEFAULT_DIRECTORY);
        let sources = ShaderSources::load(&dir).expect("bundled shaders present");
        assert!(sources.compute.contains(names::COMPUTE_ENTRY));
        assert!(sources.vertex.contains(names::VERTEX_ENTRY));
        assert!(sources.fragment.contains(names::FRAGMENT_ENTRY));
    }
}
