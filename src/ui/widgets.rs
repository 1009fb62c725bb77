use image::RgbImage;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::models::{
    actuator_status::ActuatorStatus, frame::Resolution, motion_status::MotionStatus,
    observable_state::StateSnapshot,
};

pub const CPU_LABEL: &str = "Uso da CPU";
pub const MOTION_LABEL: &str = "Sensor de Movimento";
pub const AC_LABEL: &str = "Ar-condicionado";
pub const LIGHT_LABEL: &str = "Luz da Sala";
pub const CPU_LOADING_TEXT: &str = "Carregando...";
pub const NO_VIDEO_TEXT: &str = "Webcam não disponível";

/// Upper half block. Foreground paints the top pixel, background the bottom.
const HALF_BLOCK: &str = "▀";

/// One text line per monitored value, in display order.
pub fn status_lines(snapshot: &StateSnapshot) -> Vec<Line<'static>> {
    let cpu = match snapshot.cpu_percent {
        Some(value) => Span::styled(value.to_string(), Style::default().fg(Color::Cyan)),
        None => Span::styled(CPU_LOADING_TEXT, Style::default().fg(Color::DarkGray)),
    };
    let motion_style = match snapshot.motion_status {
        MotionStatus::MotionDetected => Style::default().fg(Color::Yellow),
        MotionStatus::NoMotion => Style::default().fg(Color::DarkGray),
    };

    vec![
        labelled(CPU_LABEL, cpu),
        labelled(
            MOTION_LABEL,
            Span::styled(snapshot.motion_status.to_string(), motion_style),
        ),
        labelled(AC_LABEL, actuator_span(snapshot.ac_status)),
        labelled(LIGHT_LABEL, actuator_span(snapshot.light_status)),
    ]
}

fn labelled(label: &'static str, value: Span<'static>) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {label}: "), Style::default().fg(Color::Gray)),
        value,
    ])
}

fn actuator_span(status: ActuatorStatus) -> Span<'static> {
    let style = match status {
        ActuatorStatus::On => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        ActuatorStatus::Off => Style::default().fg(Color::DarkGray),
    };
    Span::styled(status.to_string(), style)
}

/// Largest rectangle inside `area` keeping the aspect ratio of `resolution`.
/// A terminal cell holds two pixel rows, one column.
pub fn fit_rect(area: Rect, resolution: Resolution) -> Rect {
    if area.is_empty() || resolution.width == 0 || resolution.height == 0 {
        return Rect::new(area.x, area.y, 0, 0);
    }

    // Compare width / height ratios without dividing, in pixel rows.
    let (area_width, area_rows) = (u64::from(area.width), u64::from(area.height) * 2);
    let (canvas_width, canvas_height) = (u64::from(resolution.width), u64::from(resolution.height));
    let (width, height) = if area_width * canvas_height <= area_rows * canvas_width {
        (area_width, area_width * canvas_height / canvas_width / 2)
    } else {
        (area_rows * canvas_width / canvas_height, u64::from(area.height))
    };
    let width = (width as u16).clamp(1, area.width);
    let height = (height as u16).clamp(1, area.height);

    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// Draws an image with half-block cells, scaled to fit and centred.
pub struct FrameView<'a> {
    image: &'a RgbImage,
}

impl<'a> FrameView<'a> {
    pub fn new(image: &'a RgbImage) -> Self {
        Self { image }
    }
}

impl Widget for FrameView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (image_width, image_height) = self.image.dimensions();
        let target = fit_rect(area, Resolution::new(image_width, image_height));
        if target.is_empty() {
            return;
        }

        let columns = u32::from(target.width);
        let pixel_rows = u32::from(target.height) * 2;
        for cy in 0..target.height {
            let top_row = u32::from(cy) * 2;
            let top_y = top_row * image_height / pixel_rows;
            let bottom_y = (top_row + 1) * image_height / pixel_rows;
            for cx in 0..target.width {
                let x = u32::from(cx) * image_width / columns;
                let top = self.image.get_pixel(x, top_y).0;
                let bottom = self.image.get_pixel(x, bottom_y).0;
                if let Some(cell) = buf.cell_mut((target.x + cx, target.y + cy)) {
                    cell.set_symbol(HALF_BLOCK)
                        .set_fg(Color::Rgb(top[0], top[1], top[2]))
                        .set_bg(Color::Rgb(bottom[0], bottom[1], bottom[2]));
                }
            }
        }
    }
}

/// Stand-in for the video when no frame is available: a black canvas of the
/// video resolution with a notice at its centre.
pub struct NoVideoPlaceholder {
    canvas: Resolution,
}

impl NoVideoPlaceholder {
    pub fn new(canvas: Resolution) -> Self {
        Self { canvas }
    }
}

impl Widget for NoVideoPlaceholder {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let target = fit_rect(area, self.canvas);
        if target.is_empty() {
            return;
        }
        buf.set_style(target, Style::default().bg(Color::Black));

        let centre_row = Rect::new(target.x, target.y + target.height / 2, target.width, 1);
        Paragraph::new(NO_VIDEO_TEXT)
            .style(Style::default().fg(Color::White).bg(Color::Black))
            .alignment(Alignment::Center)
            .render(centre_row, buf);
    }
}
