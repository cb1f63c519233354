// SPDX-License-Identifier: GPL-3.0-only

use crate::constants;
use cosmic::cosmic_config::{self, CosmicConfigEntry, cosmic_config_derive::CosmicConfigEntry};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Startup configuration.
///
/// Crunch factors and the selected camera are not stored. They reset on
/// every launch.
#[derive(Debug, Clone, CosmicConfigEntry, Eq, PartialEq, Default, Serialize, Deserialize)]
#[version = 1]
pub struct Config {
    /// Directory holding `vs.wgsl`, `fs.wgsl` and `cs.wgsl`
    pub shader_directory: Option<PathBuf>,
    /// Directory snapshots are written to (current directory when unset)
    pub snapshot_directory: Option<PathBuf>,
    /// Insert a `videoconvert` so the shader always receives NV12
    pub convert_to_nv12: bool,
}

impl Config {
    /// Load the config for `app_id`, falling back to defaults.
    pub fn load(app_id: &str) -> Self {
        match cosmic_config::Config::new(app_id, Self::VERSION) {
            Ok(handle) => match Self::get_entry(&handle) {
                Ok(config) => config,
                Err((errors, config)) => {
                    for err in errors {
                        tracing::warn!(error = ?err, "Ignoring invalid config entry");
                    }
                    config
                }
            },
            Err(err) => {
                tracing::warn!(error = ?err, "Config unavailable, using defaults");
                Self::default()
            }
        }
    }

    /// Directory the shader files are read from.
    ///
    /// Uses the configured directory, then `shaders/` next to the executable,
    /// then `./shaders`.
    pub fn resolve_shader_directory(&self) -> PathBuf {
        if let Some(dir) = &self.shader_directory {
            return dir.clone();
        }
        let beside_exe = std::env::current_exe().ok().and_then(|exe| {
            exe.parent()
                .map(|dir| dir.join(constants::shaders::DEFAULT_DIRECTORY))
        });
        match beside_exe {
            Some(dir) if dir.is_dir() => dir,
            _ => PathBuf::from(constants::shaders::DEFAULT_DIRECTORY),
        }
    }

    /// Directory snapshots are written to.
    pub fn resolve_snapshot_directory(&self) -> PathBuf {
        self.snapshot_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
