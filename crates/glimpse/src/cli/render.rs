//! Terminal rendering of session state: label column, percentage bar and
//! display string per prediction, plus status and failure lines.

use std::borrow::Cow;
use std::time::Duration;

use console::Style;
use glimpse_core::{DisplayPrediction, ModelStatus, SessionState};
use indicatif::{ProgressBar, ProgressStyle};

/// Bar width in terminal columns at 100%.
pub const BAR_COLUMNS: usize = 30;

/// A bar whose filled part is proportional to `percent` (0–100).
pub fn bar(percent: f64, columns: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * columns as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(columns - filled))
}

/// One line per prediction, labels padded to a common width.
pub fn result_lines(rows: &[DisplayPrediction]) -> Vec<String> {
    let label_width = rows
        .iter()
        .map(|r| r.label.chars().count())
        .max()
        .unwrap_or(0);
    let cyan = Style::new().cyan();
    let bold = Style::new().bold();

    rows.iter()
        .map(|row| {
            let label = if row.rank == 1 {
                bold.apply_to(format!("{:<width$}", row.label, width = label_width))
            } else {
                Style::new().apply_to(format!("{:<width$}", row.label, width = label_width))
            };
            format!(
                "  {}  {}  {:>6}",
                label,
                cyan.apply_to(bar(row.bar_width, BAR_COLUMNS)),
                row.display
            )
        })
        .collect()
}

pub fn model_line(status: &ModelStatus) -> String {
    match status {
        ModelStatus::Uninitialized => Style::new().dim().apply_to("model: not loaded").to_string(),
        ModelStatus::Loading => Style::new().yellow().apply_to("model: loading…").to_string(),
        ModelStatus::Ready => Style::new().green().apply_to("model: ready").to_string(),
        ModelStatus::Failed { message } => Style::new()
            .red()
            .apply_to(format!("model: failed ({message})"))
            .to_string(),
    }
}

/// Full multi-line view of a session snapshot.
pub fn render_state(state: &SessionState) -> String {
    let mut lines = vec![format!("  {}", model_line(&state.model))];

    match &state.image {
        Some(image) => {
            let dims = match (image.width, image.height) {
                (Some(w), Some(h)) => format!(" {}x{}", w, h),
                _ => String::new(),
            };
            lines.push(format!(
                "  image: {} ({}{}, {:.1} KB)",
                image.name,
                image.mime_type,
                dims,
                image.byte_size as f64 / 1024.0
            ));
        }
        None => lines.push(format!("  {}", Style::new().dim().apply_to("image: none"))),
    }

    if state.busy {
        lines.push(format!("  {}", Style::new().yellow().apply_to("working…")));
    }

    lines.extend(result_lines(&state.results));

    if let Some(failure) = &state.failure {
        lines.push(format!(
            "  {} {}",
            Style::new().red().apply_to("✗"),
            Style::new().red().apply_to(failure)
        ));
    }

    lines.join("\n")
}

/// Spinner on stderr; hidden automatically when stderr is not a terminal.
pub fn spinner(message: impl Into<Cow<'static, str>>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.magenta} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use glimpse_core::{present, Failure, FailureKind, Prediction, PredictionSet};

    fn plain(s: &str) -> String {
        console::strip_ansi_codes(s).into_owned()
    }

    #[test]
    fn test_bar_proportional() {
        assert_eq!(bar(0.0, 10), "░░░░░░░░░░");
        assert_eq!(bar(100.0, 10), "██████████");
        assert_eq!(bar(50.0, 10), "█████░░░░░");
        assert_eq!(bar(140.0, 4), "████");
    }

    #[test]
    fn test_result_lines_alignment() {
        let rows = present(&PredictionSet::new(vec![
            Prediction::new("golden retriever", 0.8234),
            Prediction::new("kuvasz", 0.05),
        ]));
        let lines: Vec<String> = result_lines(&rows).iter().map(|l| plain(l)).collect();

        assert!(lines[0].starts_with("  golden retriever  "));
        assert!(lines[0].ends_with(" 82.3%"));
        assert!(lines[1].starts_with("  kuvasz            "));
        assert!(lines[1].ends_with("  5.0%"));
        assert_eq!(lines[0].chars().count(), lines[1].chars().count());
    }

    #[test]
    fn test_render_state_with_failure() {
        let state = SessionState {
            model: ModelStatus::Ready,
            failure: Some(Failure::new(FailureKind::UnsupportedDropItem, "text/plain")),
            ..SessionState::default()
        };
        let text = plain(&render_state(&state));
        assert!(text.contains("model: ready"));
        assert!(text.contains("image: none"));
        assert!(text.contains("✗ Not an image: text/plain"));
    }

    #[test]
    fn test_render_state_busy() {
        let state = SessionState {
            model: ModelStatus::Loading,
            busy: true,
            ..SessionState::default()
        };
        let text = plain(&render_state(&state));
        assert!(text.contains("model: loading"));
        assert!(text.contains("working"));
    }
}
