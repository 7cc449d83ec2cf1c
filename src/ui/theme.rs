//! Custom theme for cliclack prompts

use cliclack::ThemeState;
use console::Style;

/// Warm yellow branding for lunchbox prompts
#[derive(Debug, Clone, Default)]
pub struct LunchboxTheme;

impl cliclack::Theme for LunchboxTheme {
    fn bar_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().yellow(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().yellow().dim(),
        }
    }

    fn state_symbol_color(&self, state: &ThemeState) -> Style {
        match state {
            ThemeState::Active => Style::new().yellow(),
            ThemeState::Error(_) => Style::new().red(),
            ThemeState::Cancel => Style::new().dim(),
            ThemeState::Submit => Style::new().green(),
        }
    }
}

/// Install the theme for every later cliclack call
pub fn init_theme() {
    cliclack::set_theme(LunchboxTheme);
}
