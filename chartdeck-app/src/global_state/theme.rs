use std::str::FromStr;

use chartdeck_charts::Theme;

/// The visual theme mode of the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThemeMode {
    System,
    Dark,
    Light,
}

impl Default for ThemeMode {
    fn default() -> Self {
        ThemeMode::Dark
    }
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::System => "system",
            ThemeMode::Dark => "dark",
            ThemeMode::Light => "light",
        }
    }

    /// The chart palette this mode resolves to; `System` falls back to
    /// dark until the host reports a preference.
    pub fn chart_theme(&self) -> Theme {
        match self {
            ThemeMode::Light => Theme::Light,
            ThemeMode::Dark | ThemeMode::System => Theme::Dark,
        }
    }

    pub fn toggled(&self) -> ThemeMode {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark | ThemeMode::System => ThemeMode::Light,
        }
    }

    /// Accent color handed to the checkout widget's theming options.
    pub fn accent_color(&self) -> &'static str {
        match self.chart_theme() {
            Theme::Dark => "#7c3aed",
            Theme::Light => "#6d28d9",
        }
    }
}

impl FromStr for ThemeMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "system" => ThemeMode::System,
            "light" => ThemeMode::Light,
            _ => ThemeMode::Dark,
        })
    }
}
