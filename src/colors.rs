//! Color support with NO_COLOR and CLICOLOR environment variable handling
//!
//! - `NO_COLOR`: if set (to any value), disable colors
//! - `CLICOLOR`: if set to 0, disable colors
//! - `CLICOLOR_FORCE`: if set to non-zero, force colors even when not a TTY
//!
//! `--json` output never carries color codes regardless of these settings.

use colored::control;

/// Configure color output once, early in main()
pub fn init_colors(json: bool) {
    control::set_override(colors_enabled(
        json,
        std::env::var("NO_COLOR").is_ok(),
        std::env::var("CLICOLOR_FORCE").ok().as_deref(),
        std::env::var("CLICOLOR").ok().as_deref(),
        std::io::IsTerminal::is_terminal(&std::io::stdout()),
    ));
}

fn colors_enabled(
    json: bool,
    no_color: bool,
    clicolor_force: Option<&str>,
    clicolor: Option<&str>,
    is_tty: bool,
) -> bool {
    if json || no_color {
        return false;
    }
    if clicolor_force.is_some_and(|v| v != "0") {
        return true;
    }
    if clicolor == Some("0") {
        return false;
    }
    is_tty
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_color_wins() {
        assert!(!colors_enabled(false, true, Some("1"), None, true));
    }

    #[test]
    fn test_json_never_colored() {
        assert!(!colors_enabled(true, false, Some("1"), None, true));
    }

    #[test]
    fn test_force_overrides_tty() {
        assert!(colors_enabled(false, false, Some("1"), Some("0"), false));
        assert!(!colors_enabled(false, false, Some("0"), None, false));
    }

    #[test]
    fn test_clicolor_zero_disables() {
        assert!(!colors_enabled(false, false, None, Some("0"), true));
        assert!(colors_enabled(false, false, None, None, true));
    }
}
