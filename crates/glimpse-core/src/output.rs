//! Output formatting for classification reports.
//!
//! A [`ClassificationReport`] is the final state of a session reduced to
//! what a one-shot caller wants to print: the image, the ranked rows and
//! the failure, if any. [`OutputWriter`] writes it as JSON or plain text.

use serde::Serialize;
use std::io::{self, Write};

use crate::model::ModelStatus;
use crate::present::DisplayPrediction;
use crate::session::{CurrentImage, Failure, SessionState};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable ranked list
    Text,
    /// Single JSON object
    Json,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Final result of classifying one image.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    pub model: ModelStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<CurrentImage>,

    pub predictions: Vec<DisplayPrediction>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,

    /// `data:` URL of the image bytes, for embedding in other UIs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_url: Option<String>,
}

impl ClassificationReport {
    pub fn from_state(state: &SessionState) -> Self {
        Self {
            model: state.model.clone(),
            image: state.image.clone(),
            predictions: state.results.clone(),
            failure: state.failure.clone(),
            data_url: None,
        }
    }

    /// Attach the image as a `data:` URL.
    pub fn with_data_url(mut self) -> Self {
        self.data_url = self.image.as_ref().map(|image| image.resource.data_url());
        self
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none() && !self.predictions.is_empty()
    }
}

/// A writer that serializes reports as JSON or text.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
}

impl<W: Write> OutputWriter<W> {
    /// Create a new output writer.
    ///
    /// `pretty` only affects JSON.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
        }
    }

    /// Write a single report.
    pub fn write(&mut self, report: &ClassificationReport) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, report)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, report).map_err(io::Error::other)?;
                }
                writeln!(self.writer)?;
            }
            OutputFormat::Text => self.write_text(report)?,
        }
        Ok(())
    }

    fn write_text(&mut self, report: &ClassificationReport) -> io::Result<()> {
        if let Some(image) = &report.image {
            match (image.width, image.height) {
                (Some(w), Some(h)) => writeln!(self.writer, "{} ({}x{})", image.name, w, h)?,
                _ => writeln!(self.writer, "{}", image.name)?,
            }
        }

        let label_width = report
            .predictions
            .iter()
            .map(|p| p.label.chars().count())
            .max()
            .unwrap_or(0);
        for row in &report.predictions {
            writeln!(
                self.writer,
                "{:>2}. {:<width$}  {:>6}",
                row.rank,
                row.label,
                row.display,
                width = label_width
            )?;
        }

        if let Some(failure) = &report.failure {
            writeln!(self.writer, "error: {}", failure)?;
        }
        if let Some(url) = &report.data_url {
            writeln!(self.writer, "{}", url)?;
        }
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Consume the writer and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
