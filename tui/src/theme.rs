//! Theme and Colors

use ratatui::style::Color;

/// Accent for titles and the assistant
pub const ACCENT: Color = Color::Magenta;

/// User input green
pub const USER_GREEN: Color = Color::Rgb(130, 220, 130);

/// System/dim text
pub const DIM_GRAY: Color = Color::Rgb(100, 100, 100);

/// Error red
pub const ERROR_RED: Color = Color::Rgb(255, 80, 80);

/// Warning amber
pub const WARNING_AMBER: Color = Color::Rgb(255, 190, 90);

/// Success green
pub const SUCCESS_GREEN: Color = Color::Rgb(120, 230, 120);

/// Info blue
pub const INFO_BLUE: Color = Color::Rgb(150, 180, 255);
