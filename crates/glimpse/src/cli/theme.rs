//! Dialoguer theme and banner for the interactive session.

use console::{style, Style};
use dialoguer::theme::ColorfulTheme;

/// Returns a `ColorfulTheme` with Glimpse's colors.
///
/// - Prompt prefix: magenta `›`
/// - Success prefix: green `✓`
/// - Error prefix: red `✗`
pub fn glimpse_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("›".to_string()).for_stderr().magenta(),
        prompt_style: Style::new().for_stderr().bold(),
        prompt_suffix: style("".to_string()).for_stderr(),
        success_prefix: style("✓".to_string()).for_stderr().green(),
        success_suffix: style("·".to_string()).for_stderr().bright().black(),
        error_prefix: style("✗".to_string()).for_stderr().red(),
        error_style: Style::new().for_stderr().red(),
        values_style: Style::new().for_stderr().green(),
        ..ColorfulTheme::default()
    }
}

/// Prints the session banner and command summary to stderr.
pub fn print_banner() {
    let version_line = format!("Glimpse v{}", glimpse_core::VERSION);
    let tagline = "drop in an image, get ranked labels";
    let inner_width = tagline.len() + 4;

    let magenta = Style::new().for_stderr().magenta();
    let dim = Style::new().for_stderr().dim();

    eprintln!();
    eprintln!("{}", magenta.apply_to(format!("  ╭{:─<width$}╮", "", width = inner_width)));
    eprintln!("{}", magenta.apply_to(format!("  │{:^width$}│", version_line, width = inner_width)));
    eprintln!("{}", magenta.apply_to(format!("  │{:^width$}│", tagline, width = inner_width)));
    eprintln!("{}", magenta.apply_to(format!("  ╰{:─<width$}╯", "", width = inner_width)));
    eprintln!("  {}", dim.apply_to(super::session::HELP));
    eprintln!();
}
