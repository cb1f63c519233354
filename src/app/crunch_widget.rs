// SPDX-License-Identifier: GPL-3.0-only

//! Preview widget presenting the crunched camera frame

use crate::app::crunch_primitive::CrunchPrimitive;
use crate::app::state::Message;
use cosmic::iced::advanced::widget::Tree;
use cosmic::iced::advanced::{Widget, layout};
use cosmic::iced::{Element, Length, Rectangle, Size};
use cosmic::iced_wgpu::primitive::Renderer as PrimitiveRenderer;
use cosmic::{Renderer, Theme};

/// Letterboxed view of the compute output
pub struct CrunchWidget {
    primitive: CrunchPrimitive,
    aspect_ratio: f32,
}

impl CrunchWidget {
    /// `width`/`height` give the aspect ratio of the camera frame.
    pub fn new(primitive: CrunchPrimitive, width: u32, height: u32) -> Self {
        let aspect_ratio = if width > 0 && height > 0 {
            width as f32 / height as f32
        } else {
            16.0 / 9.0
        };
        Self {
            primitive,
            aspect_ratio,
        }
    }
}

/// Largest size with `aspect_ratio` fitting inside `max`
pub fn contain(max: Size, aspect_ratio: f32) -> Size {
    let width_based_height = max.width / aspect_ratio;
    if width_based_height <= max.height {
        Size::new(max.width, width_based_height)
    } else {
        Size::new(max.height * aspect_ratio, max.height)
    }
}

impl Widget<Message, Theme, Renderer> for CrunchWidget {
    fn size(&self) -> Size<Length> {
        Size::new(Length::Fill, Length::Fill)
    }

    fn layout(
        &self,
        _tree: &mut Tree,
        _renderer: &Renderer,
        limits: &layout::Limits,
    ) -> layout::Node {
        layout::Node::new(contain(limits.max(), self.aspect_ratio))
    }

    fn draw(
        &self,
        _tree: &Tree,
        renderer: &mut Renderer,
        _theme: &Theme,
        _style: &cosmic::iced::advanced::renderer::Style,
        layout: layout::Layout<'_>,
        _cursor: cosmic::iced::mouse::Cursor,
        _viewport: &Rectangle,
    ) {
        renderer.draw_primitive(layout.bounds(), self.primitive.clone());
    }
}

impl<'a> From<CrunchWidget> for Element<'a, Message, Theme, Renderer> {
    fn from(widget: CrunchWidget) -> Self {
        Element::new(widget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contain_limited_by_height() {
        let size = contain(Size::new(1000.0, 300.0), 16.0 / 9.0);
        assert!((size.height - 300.0).abs() < 1e-3);
        assert!((size.width - 533.333).abs() < 1e-2);
    }

    #[test]
    fn test_contain_limited_by_width() {
        let size = contain(Size::new(640.0, 1000.0), 4.0 / 3.0);
        assert_eq!(size.width, 640.0);
        assert!((size.height - 480.0).abs() < 1e-3);
    }
}
