// SPDX-License-Identifier: GPL-3.0-only

//! Main application view
//!
//! The crunched preview fills the left side; the controls column on the
//! right holds the camera picker, the three crunch sliders and the save
//! button.

use crate::app::crunch_widget::CrunchWidget;
use crate::app::log_slider::{self, LogSlider};
use crate::app::state::{AppModel, Message};
use crate::constants::{crunch, ui};
use crate::fl;
use cosmic::Element;
use cosmic::iced::{Alignment, Length};
use cosmic::widget;

impl AppModel {
    pub fn view(&self) -> Element<'_, Message> {
        let spacing = cosmic::theme::spacing();

        let preview: Element<'_, Message> = match &self.camera_spec {
            Some(spec) => CrunchWidget::new(
                self.preview.with_settings(self.settings),
                spec.width,
                spec.height,
            )
            .into(),
            None => widget::container(widget::text::body(fl!("waiting-for-camera")))
                .center(Length::Fill)
                .into(),
        };

        widget::row()
            .push(
                widget::container(preview)
                    .center(Length::Fill)
                    .width(Length::Fill),
            )
            .push(self.controls_view())
            .spacing(spacing.space_s)
            .padding(spacing.space_s)
            .into()
    }

    fn controls_view(&self) -> Element<'_, Message> {
        let spacing = cosmic::theme::spacing();

        let camera_dropdown = widget::dropdown(
            &self.camera_dropdown_options,
            self.current_camera_index,
            Message::SelectCamera,
        );

        let mut controls = widget::column()
            .push(widget::text::heading(fl!("camera")))
            .push(camera_dropdown)
            .spacing(spacing.space_xs)
            .width(Length::Fixed(ui::CONTROLS_WIDTH));

        let save_button = widget::button::standard(fl!(
            "save-snapshot",
            path = self.snapshots.next_file_name()
        ));
        // No on_press until the previous snapshot is written
        let save_button = if self.snapshots.is_pending() {
            save_button
        } else {
            save_button.on_press(Message::SaveSnapshot)
        };

        if !self.camera_is_nv12() {
            controls = controls
                .push(widget::text::body(fl!("format-warning")))
                .push(widget::text::caption(fl!("format-warning-detail")));
        }

        controls
            .push(slider_row(
                fl!("crunch-base"),
                log_slider::BASE,
                self.settings.base,
                Message::SetCrunchBase,
            ))
            .push(slider_row(
                fl!("crunch-horizontal"),
                log_slider::HORIZONTAL,
                self.settings.horizontal,
                Message::SetCrunchHorizontal,
            ))
            .push(slider_row(
                fl!("crunch-vertical"),
                log_slider::VERTICAL,
                self.settings.vertical,
                Message::SetCrunchVertical,
            ))
            .push(save_button)
            .into()
    }
}

/// Label, log-scale slider and current value
fn slider_row<'a>(
    label: String,
    scale: LogSlider,
    value: f32,
    on_change: fn(f32) -> Message,
) -> Element<'a, Message> {
    let spacing = cosmic::theme::spacing();

    widget::row()
        .push(widget::text::body(label).width(Length::Fixed(ui::SLIDER_LABEL_WIDTH)))
        .push(
            widget::slider(scale.range(), scale.position(value), on_change)
                .step(crunch::LOG_SLIDER_STEP)
                .width(Length::Fill),
        )
        .push(
            widget::text::body(format!("{:.2}", value))
                .width(Length::Fixed(ui::SLIDER_VALUE_WIDTH)),
        )
        .spacing(spacing.space_xs)
        .align_y(Alignment::Center)
        .into()
}
