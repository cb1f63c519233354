// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Window constants
pub mod window {
    /// Initial window width
    pub const DEFAULT_WIDTH: f32 = 1280.0;

    /// Initial window height
    pub const DEFAULT_HEIGHT: f32 = 720.0;

    /// Minimum window width
    pub const MIN_WIDTH: f32 = 360.0;

    /// Minimum window height
    pub const MIN_HEIGHT: f32 = 180.0;
}

/// Crunch slider ranges and defaults
pub mod crunch {
    /// Base factor lower bound. Keeps every quantization cell positive.
    pub const BASE_MIN: f32 = 1.0;
    pub const BASE_MAX: f32 = 128.0;
    pub const BASE_DEFAULT: f32 = 3.0;

    pub const HORIZONTAL_MIN: f32 = 0.1;
    pub const HORIZONTAL_MAX: f32 = 128.0;
    pub const HORIZONTAL_DEFAULT: f32 = 5.0;

    pub const VERTICAL_MIN: f32 = 0.1;
    pub const VERTICAL_MAX: f32 = 128.0;
    pub const VERTICAL_DEFAULT: f32 = 5.0;

    /// Step of the slider in natural-log space
    pub const LOG_SLIDER_STEP: f32 = 0.001;

    /// Divisor applied to every quantization cell
    pub const QUANT_DIVISOR: f32 = 255.0;
}

/// Timing constants
pub mod timing {
    use std::time::Duration;

    /// Delay between camera permission queries
    pub const PERMISSION_POLL_INTERVAL: Duration = Duration::from_millis(200);

    /// Delay before retrying when the camera has no frame ready
    pub const FRAME_POLL_INTERVAL: Duration = Duration::from_millis(5);
}

/// GStreamer pipeline constants
pub mod pipeline {
    /// Maximum buffer queue size (keep small for low latency)
    pub const MAX_BUFFERS: u32 = 2;

    /// Caps accepted by the appsink, NV12 first
    pub const SINK_CAPS: &str = "video/x-raw,format=NV12; video/x-raw";

    /// Caps used when conversion to NV12 is forced
    pub const NV12_CAPS: &str = "video/x-raw,format=NV12";

    /// Device monitor class for cameras
    pub const DEVICE_CLASS: &str = "Video/Source";

    /// Channel capacity of the capture subscription
    pub const FRAME_CHANNEL_CAPACITY: usize = 4;
}

/// Shader file names and entry points
pub mod shaders {
    pub const VERTEX_FILE: &str = "vs.wgsl";
    pub const FRAGMENT_FILE: &str = "fs.wgsl";
    pub const COMPUTE_FILE: &str = "cs.wgsl";

    pub const VERTEX_ENTRY: &str = "vs_main";
    pub const FRAGMENT_ENTRY: &str = "fs_main";
    pub const COMPUTE_ENTRY: &str = "cs_main";

    /// Default directory searched for shader files
    pub const DEFAULT_DIRECTORY: &str = "shaders";

    /// Pixel tile handled by one compute workgroup
    pub const TILE_SIZE: u32 = 16;
}

/// Snapshot file naming
pub mod snapshot {
    pub const FILE_PREFIX: &str = "Image";
    pub const FILE_EXTENSION: &str = "png";
    /// First number handed out
    pub const FIRST_INDEX: u32 = 1;
}

/// Layout of the controls column
pub mod ui {
    pub const CONTROLS_WIDTH: f32 = 320.0;
    pub const SLIDER_LABEL_WIDTH: f32 = 90.0;
    pub const SLIDER_VALUE_WIDTH: f32 = 50.0;
}
