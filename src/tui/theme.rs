use ratatui::style::{Color, Modifier, Style};

/// Color scheme for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,

    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,

    // Tables
    pub header_fg: Color,
    pub header_bg: Color,
    /// Background of the first (key) column header
    pub key_header_bg: Color,
    pub cursor_fg: Color,
    pub cursor_bg: Color,

    // Checklists and actions
    pub checked: Color,
    pub locked: Color,
    pub action: Color,

    // Status
    pub success: Color,
    pub error: Color,
    pub warning: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            name: "Dark".to_string(),
            foreground: Color::Gray,
            border: Color::DarkGray,
            border_focused: Color::Cyan,
            header_fg: Color::Cyan,
            header_bg: Color::Reset,
            key_header_bg: Color::Rgb(40, 70, 110),
            cursor_fg: Color::Black,
            cursor_bg: Color::Cyan,
            checked: Color::Green,
            locked: Color::DarkGray,
            action: Color::Rgb(76, 175, 80),
            success: Color::Green,
            error: Color::Red,
            warning: Color::Yellow,
        }
    }

    pub fn light() -> Self {
        Self {
            name: "Light".to_string(),
            foreground: Color::Black,
            border: Color::Gray,
            border_focused: Color::Blue,
            header_fg: Color::Black,
            header_bg: Color::Rgb(242, 242, 242),
            key_header_bg: Color::Rgb(173, 216, 230),
            cursor_fg: Color::White,
            cursor_bg: Color::Blue,
            checked: Color::Rgb(0, 128, 0),
            locked: Color::Gray,
            action: Color::Rgb(56, 142, 60),
            success: Color::Rgb(0, 128, 0),
            error: Color::Red,
            warning: Color::Rgb(200, 150, 0),
        }
    }

    /// Theme by config name; unknown names fall back to dark
    pub fn by_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "light" => Self::light(),
            _ => Self::dark(),
        }
    }

    pub fn header_style(&self) -> Style {
        Style::default()
            .fg(self.header_fg)
            .bg(self.header_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn key_header_style(&self) -> Style {
        self.header_style().bg(self.key_header_bg)
    }

    pub fn cursor_style(&self) -> Style {
        Style::default()
            .fg(self.cursor_fg)
            .bg(self.cursor_bg)
            .add_modifier(Modifier::BOLD)
    }

    pub fn normal_style(&self) -> Style {
        Style::default().fg(self.foreground)
    }

    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused { self.border_focused } else { self.border })
    }

    pub fn checked_style(&self) -> Style {
        Style::default().fg(self.checked)
    }

    pub fn locked_style(&self) -> Style {
        Style::default().fg(self.locked).add_modifier(Modifier::ITALIC)
    }

    pub fn action_style(&self) -> Style {
        Style::default().fg(self.action).add_modifier(Modifier::BOLD)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn warning_style(&self) -> Style {
        Style::default().fg(self.warning)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}
