//! The `glimpse classify` command: one image in, ranked labels out.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use glimpse_core::{
    ClassificationReport, Config, DroppedItem, Glimpse, OutputFormat as CoreOutputFormat,
    OutputWriter, PickedFile,
};

use super::render;

/// Supported output formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Ranked list with bars
    Text,
    /// Single JSON object
    Json,
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => CoreOutputFormat::Text,
            OutputFormat::Json => CoreOutputFormat::Json,
        }
    }
}

/// Arguments for the `classify` command.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Image file to classify
    #[arg(required = true)]
    pub path: PathBuf,

    /// Submit the file as a drag-and-drop payload instead of a picked file
    #[arg(long)]
    pub drop: bool,

    /// Declared MIME type (defaults to a guess from the extension)
    #[arg(long)]
    pub mime: Option<String>,

    /// Output format (defaults to `output.format` from the config)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Include the image as a base64 `data:` URL
    #[arg(long)]
    pub data_url: bool,
}

/// Execute the classify command.
pub async fn execute(args: ClassifyArgs, config: Config) -> anyhow::Result<()> {
    let path = PathBuf::from(shellexpand::tilde(&args.path.to_string_lossy()).into_owned());
    if !path.exists() {
        anyhow::bail!(
            "Input path does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            path
        );
    }

    let format: CoreOutputFormat = match args.format {
        Some(format) => format.into(),
        None => CoreOutputFormat::parse(&config.output.format).unwrap_or(CoreOutputFormat::Text),
    };
    let pretty = args.pretty || config.output.pretty;

    let glimpse = Glimpse::new(config);
    let session = glimpse.session();

    let spinner = render::spinner("Loading model…");
    let loaded = session.startup().await;
    spinner.finish_and_clear();
    if let Err(e) = loaded {
        anyhow::bail!("{e}");
    }

    let spinner = render::spinner("Classifying…");
    let outcome = if args.drop {
        let mut item = DroppedItem::from_path(&path, &glimpse.config().limits)?;
        if let Some(mime) = args.mime {
            item.mime_type = mime;
        }
        session.drop_items(vec![item]).await
    } else {
        let mut file = PickedFile::from_path(&path, &glimpse.config().limits)?;
        if let Some(mime) = args.mime {
            file.mime_type = mime;
        }
        session.pick_file(Some(file)).await
    };
    spinner.finish_and_clear();
    tracing::debug!("Classification outcome: {:?}", outcome);

    let mut report = ClassificationReport::from_state(&session.snapshot());
    if args.data_url {
        report = report.with_data_url();
    }

    let stdout = io::stdout();
    if format == CoreOutputFormat::Text && console::Term::stdout().is_term() {
        let state = session.snapshot();
        let mut out = stdout.lock();
        writeln!(out, "{}", render::render_state(&state))?;
        if let Some(url) = &report.data_url {
            writeln!(out, "{}", url)?;
        }
    } else {
        let mut writer = OutputWriter::new(stdout.lock(), format, pretty);
        writer.write(&report)?;
        writer.flush()?;
    }

    match report.failure {
        Some(failure) => anyhow::bail!("{}", failure),
        None => Ok(()),
    }
}
