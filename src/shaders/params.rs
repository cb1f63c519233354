// SPDX-License-Identifier: GPL-3.0-only

//! Crunch shader parameters
//!
//! [`FrameParams`] is uploaded verbatim as the compute shader's uniform block,
//! so its layout mirrors `FrameParams` in `cs.wgsl` exactly. [`CrunchSettings`]
//! holds the three user-facing factors the quantization tables are derived from.

use crate::constants::crunch;

/// Side length of a transform block
pub const BLOCK_DIM: usize = 8;

/// Quantization table indexed `[row][col]`
pub type QuantTable = [[f32; BLOCK_DIM]; BLOCK_DIM];

/// Uniform block consumed by the crunch compute shader
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameParams {
    /// Frame width in pixels
    pub frame_width: u32,
    /// Frame height in pixels
    pub frame_height: u32,
    /// Bytes per luma row
    pub row_byte_stride: u32,
    /// Byte offset of the interleaved chroma plane
    pub uv_byte_offset: u32,
    /// 60 words that pad the header out to 256 bytes
    pub padding: [[u32; 4]; 15],
    /// Quantization step per block position
    pub quant_table: QuantTable,
    /// Reciprocal of `quant_table`
    pub quant_table_inv: QuantTable,
}

const _: () = assert!(std::mem::size_of::<FrameParams>() % 256 == 0);
const _: () = assert!(std::mem::size_of::<FrameParams>() == 768);

impl FrameParams {
    /// Size of the uniform buffer in bytes
    pub const SIZE: u64 = std::mem::size_of::<FrameParams>() as u64;

    /// Set the frame geometry for a tightly packed NV12 frame.
    pub fn set_frame_geometry(&mut self, width: u32, height: u32) {
        self.frame_width = width;
        self.frame_height = height;
        self.row_byte_stride = width;
        self.uv_byte_offset = width * height;
    }

    /// Recompute both quantization tables from the current settings.
    pub fn update_quantization(&mut self, settings: &CrunchSettings) {
        for row in 0..BLOCK_DIM {
            for col in 0..BLOCK_DIM {
                let cell = quant_cell(settings, row, col);
                self.quant_table[row][col] = cell;
                self.quant_table_inv[row][col] = 1.0 / cell;
            }
        }
    }
}

impl Default for FrameParams {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

/// Quantization step for one block position.
///
/// `((vertical * row + base) * (horizontal * col + base)) / 255`. Callers
/// keep `base` at or above 1 so the result stays positive.
pub fn quant_cell(settings: &CrunchSettings, row: usize, col: usize) -> f32 {
    let vertical = settings.vertical * row as f32 + settings.base;
    let horizontal = settings.horizontal * col as f32 + settings.base;
    vertical * horizontal / crunch::QUANT_DIVISOR
}

/// The three crunch factors driven by the sliders
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrunchSettings {
    pub base: f32,
    pub horizontal: f32,
    pub vertical: f32,
}

impl Default for CrunchSettings {
    fn default() -> Self {
        Self {
            base: crunch::BASE_DEFAULT,
            horizontal: crunch::HORIZONTAL_DEFAULT,
            vertical: crunch::VERTICAL_DEFAULT,
        }
    }
}

impl CrunchSettings {
    pub fn set_base(&mut self, value: f32) {
        self.base = value.clamp(crunch::BASE_MIN, crunch::BASE_MAX);
    }

    pub fn set_horizontal(&mut self, value: f32) {
        self.horizontal = value.clamp(crunch::HORIZONTAL_MIN, crunch::HORIZONTAL_MAX);
    }

    pub fn set_vertical(&mut self, value: f32) {
        self.vertical = value.clamp(crunch::VERTICAL_MIN, crunch::VERTICAL_MAX);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_matches_shader_block() {
        assert_eq!(FrameParams::SIZE, 768);
        assert_eq!(std::mem::offset_of!(FrameParams, quant_table), 256);
        assert_eq!(std::mem::offset_of!(FrameParams, quant_table_inv), 512);
    }

    #[test]
    fn test_frame_geometry() {
        let mut params = FrameParams::default();
        params.set_frame_geometry(640, 480);
        assert_eq!(params.row_byte_stride, 640);
        assert_eq!(params.uv_byte_offset, 640 * 480);
    }

    #[test]
    fn test_default_origin_cell() {
        let settings = CrunchSettings::default();
        let cell = quant_cell(&settings, 0, 0);
        assert!((cell - 9.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_cells_grow_with_block_index() {
        let mut params = FrameParams::default();
        params.update_quantization(&CrunchSettings::default());
        assert!(params.quant_table[0][1] > params.quant_table[0][0]);
        assert!(params.quant_table[1][0] > params.quant_table[0][0]);
        assert!(params.quant_table[7][7] > params.quant_table[6][7]);
    }

    #[test]
    fn test_setters_clamp() {
        let mut settings = CrunchSettings::default();
        settings.set_base(0.2);
        assert_eq!(settings.base, crunch::BASE_MIN);
        settings.set_horizontal(500.0);
        assert_eq!(settings.horizontal, crunch::HORIZONTAL_MAX);
        settings.set_vertical(0.0);
        assert_eq!(settings.vertical, crunch::VERTICAL_MIN);
    }
}
