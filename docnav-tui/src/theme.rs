//! Theme system for dark/light modes

use docnav_core::config::ThemeVariant;
use ratatui::style::{Color, Modifier, Style};

/// Theme definition
#[derive(Clone, Debug)]
pub struct Theme {
    pub base: Style,
    pub heading: [Style; 6],
    pub code: Style,
    pub link: Style,
    pub quote: Style,
    pub list_marker: Style,
    pub muted: Style,
    pub mark: Style,
    pub mark_active: Style,
    pub section_header: Style,
    pub copy_control: Style,
    pub copy_control_copied: Style,
    pub tooltip: Style,
    pub topbar: Style,
    pub topbar_button: Style,
    pub toc_bg: Color,
    pub toc_border: Color,
    pub toc_active: Style,
    pub toc_selected: Style,
    pub scrollbar_track: Style,
    pub scrollbar_thumb: Style,
    pub search_input: Style,
    pub suggestion: Style,
    pub suggestion_selected: Style,
    pub status_bar_fg: Color,
    pub status_bar_bg: Color,
    pub error: Style,
}

impl Theme {
    /// Create a theme for the given variant
    pub fn for_variant(variant: ThemeVariant) -> Self {
        match variant {
            ThemeVariant::Dark => Self::dark(),
            ThemeVariant::Light => Self::light(),
        }
    }

    /// Style of a heading element (`h1` = level 1)
    pub fn heading_style(&self, level: usize) -> Style {
        self.heading[level.clamp(1, 6) - 1]
    }

    /// Dark theme (default)
    pub fn dark() -> Self {
        Self {
            base: Style::default().fg(Color::White),
            heading: [
                Style::default()
                    .fg(Color::LightBlue)
                    .add_modifier(Modifier::BOLD),
                Style::default()
                    .fg(Color::LightCyan)
                    .add_modifier(Modifier::BOLD),
                Style::default()
                    .fg(Color::LightGreen)
                    .add_modifier(Modifier::BOLD),
                Style::default()
                    .fg(Color::LightYellow)
                    .add_modifier(Modifier::BOLD),
                Style::default()
                    .fg(Color::LightMagenta)
                    .add_modifier(Modifier::BOLD),
                Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
            ],
            code: Style::default().fg(Color::Yellow),
            link: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::UNDERLINED),
            quote: Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
            list_marker: Style::default().fg(Color::LightRed),
            muted: Style::default().fg(Color::DarkGray),
            mark: Style::default().fg(Color::Black).bg(Color::Yellow),
            mark_active: Style::default()
                .fg(Color::Black)
                .bg(Color::LightRed)
                .add_modifier(Modifier::BOLD),
            section_header: Style::default().fg(Color::DarkGray),
            copy_control: Style::default().fg(Color::DarkGray),
            copy_control_copied: Style::default()
                .fg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
            tooltip: Style::default()
                .fg(Color::Black)
                .bg(Color::LightGreen)
                .add_modifier(Modifier::BOLD),
            topbar: Style::default().fg(Color::White).bg(Color::Rgb(30, 30, 46)),
            topbar_button: Style::default()
                .fg(Color::LightCyan)
                .bg(Color::Rgb(30, 30, 46))
                .add_modifier(Modifier::BOLD),
            toc_bg: Color::Black,
            toc_border: Color::DarkGray,
            toc_active: Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
            toc_selected: Style::default()
                .fg(Color::Black)
                .bg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
            scrollbar_track: Style::default().fg(Color::Rgb(50, 50, 50)),
            scrollbar_thumb: Style::default().fg(Color::Gray),
            search_input: Style::default().fg(Color::White).bg(Color::Rgb(40, 40, 40)),
            suggestion: Style::default().fg(Color::Gray).bg(Color::Rgb(40, 40, 40)),
            suggestion_selected: Style::default()
                .fg(Color::Black)
                .bg(Color::LightCyan),
            status_bar_fg: Color::Black,
            status_bar_bg: Color::LightBlue,
            error: Style::default().fg(Color::LightRed),
        }
    }

    /// Light theme
    pub fn light() -> Self {
        Self {
            base: Style::default().fg(Color::Black),
            heading: [
                Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::BOLD),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
                Style::default()
                    .fg(Color::Rgb(150, 100, 0))
                    .add_modifier(Modifier::BOLD), // Dark yellow
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            ],
            code: Style::default().fg(Color::Rgb(150, 75, 0)), // Orange-brown
            link: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
            quote: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            list_marker: Style::default().fg(Color::Red),
            muted: Style::default().fg(Color::Gray),
            mark: Style::default().fg(Color::Black).bg(Color::Rgb(255, 235, 130)),
            mark_active: Style::default()
                .fg(Color::White)
                .bg(Color::Rgb(200, 80, 0))
                .add_modifier(Modifier::BOLD),
            section_header: Style::default().fg(Color::Gray),
            copy_control: Style::default().fg(Color::Gray),
            copy_control_copied: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            tooltip: Style::default()
                .fg(Color::White)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
            topbar: Style::default().fg(Color::Black).bg(Color::Rgb(235, 235, 245)),
            topbar_button: Style::default()
                .fg(Color::Blue)
                .bg(Color::Rgb(235, 235, 245))
                .add_modifier(Modifier::BOLD),
            toc_bg: Color::White,
            toc_border: Color::Gray,
            toc_active: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            toc_selected: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            scrollbar_track: Style::default().fg(Color::Rgb(220, 220, 220)),
            scrollbar_thumb: Style::default().fg(Color::DarkGray),
            search_input: Style::default().fg(Color::Black).bg(Color::Rgb(240, 240, 240)),
            suggestion: Style::default().fg(Color::DarkGray).bg(Color::Rgb(240, 240, 240)),
            suggestion_selected: Style::default().fg(Color::White).bg(Color::Blue),
            status_bar_fg: Color::White,
            status_bar_bg: Color::Blue,
            error: Style::default().fg(Color::Red),
        }
    }
}
