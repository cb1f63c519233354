// SPDX-License-Identifier: GPL-3.0-only

//! Logarithmic slider mapping
//!
//! Sliders move linearly over `ln(value)`, so every doubling of a crunch
//! factor takes the same travel.

use crate::constants::crunch;
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogSlider {
    pub min: f32,
    pub max: f32,
}

pub const BASE: LogSlider = LogSlider::new(crunch::BASE_MIN, crunch::BASE_MAX);
pub const HORIZONTAL: LogSlider = LogSlider::new(crunch::HORIZONTAL_MIN, crunch::HORIZONTAL_MAX);
pub const VERTICAL: LogSlider = LogSlider::new(crunch::VERTICAL_MIN, crunch::VERTICAL_MAX);

impl LogSlider {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Slider range in log space
    pub fn range(&self) -> RangeInclusive<f32> {
        self.min.ln()..=self.max.ln()
    }

    /// Slider position for a value
    pub fn position(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max).ln()
    }

    /// Value for a slider position
    pub fn value(&self, position: f32) -> f32 {
        position.exp().clamp(self.min, self.max)
    }
}
