//! The `glimpse models` command for managing classification models.
//!
//! Downloads record the BLAKE3 digest of every file next to it
//! (`model.onnx.blake3`), so `glimpse models list` can tell a file that was
//! truncated or modified after download from a good one.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use glimpse_core::model::labels::CONFIG_FILENAME;
use glimpse_core::model::onnx::MODEL_FILENAME;
use glimpse_core::Config;

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Download a model variant (ONNX weights + label config)
    Download {
        /// Variant to download (defaults to `model.name` from the config)
        #[arg(long)]
        variant: Option<String>,

        /// Re-download files that already exist
        #[arg(long)]
        force: bool,
    },

    /// List known and installed models
    List,

    /// Show model directory path
    Path,
}

/// One file of a model variant.
struct RemoteFile {
    remote_path: &'static str,
    local_name: &'static str,
}

/// Downloadable classification model variants.
struct ModelVariant {
    name: &'static str,
    label: &'static str,
    repo: &'static str,
    files: &'static [RemoteFile],
}

const VARIANTS: &[ModelVariant] = &[
    ModelVariant {
        name: "mobilenet-v2",
        label: "MobileNetV2 1.0 (224)",
        repo: "Xenova/mobilenet_v2_1.0_224",
        files: &[
            RemoteFile {
                remote_path: "onnx/model.onnx",
                local_name: MODEL_FILENAME,
            },
            RemoteFile {
                remote_path: "config.json",
                local_name: CONFIG_FILENAME,
            },
        ],
    },
    ModelVariant {
        name: "mobilenet-v2-quantized",
        label: "MobileNetV2 1.0 (224, int8)",
        repo: "Xenova/mobilenet_v2_1.0_224",
        files: &[
            RemoteFile {
                remote_path: "onnx/model_quantized.onnx",
                local_name: MODEL_FILENAME,
            },
            RemoteFile {
                remote_path: "config.json",
                local_name: CONFIG_FILENAME,
            },
        ],
    },
];

/// Suffix of the digest file written next to each download.
const DIGEST_SUFFIX: &str = "blake3";

fn find_variant(name: &str) -> Option<&'static ModelVariant> {
    VARIANTS.iter().find(|v| v.name == name)
}

/// Integrity of a file on disk.
#[derive(Debug, PartialEq, Eq)]
enum FileStatus {
    Missing,
    /// Present, digest matches the one recorded at download time
    Verified,
    /// Present, but no digest was recorded (e.g. copied in by hand)
    Unverified,
    /// Present, digest differs from the recorded one
    Corrupt,
}

impl FileStatus {
    fn label(&self) -> &'static str {
        match self {
            FileStatus::Missing => "not installed",
            FileStatus::Verified => "ready",
            FileStatus::Unverified => "ready (unverified)",
            FileStatus::Corrupt => "corrupt",
        }
    }
}

/// Execute the models command.
pub async fn execute(args: ModelsArgs, config: &Config) -> anyhow::Result<()> {
    match args.command {
        ModelsCommand::Download { variant, force } => {
            let name = variant.unwrap_or_else(|| config.model.name.clone());
            let Some(variant) = find_variant(&name) else {
                anyhow::bail!(
                    "Unknown model variant: {name}\n  Known variants: {}",
                    VARIANTS.iter().map(|v| v.name).collect::<Vec<_>>().join(", ")
                );
            };

            let client = reqwest::Client::new();
            download_variant(variant, &config.model_dir(), &client, force).await?;

            if variant.name != config.model.name {
                tracing::info!(
                    "Set `model.name = \"{}\"` in your config to use this variant.",
                    variant.name
                );
            }
            tracing::info!("All downloads complete.");
        }

        ModelsCommand::List => {
            let model_dir = config.model_dir();

            if !model_dir.exists() {
                println!("No models installed.");
                println!("Run `glimpse models download` to download the default model.");
                return Ok(());
            }

            println!("Models:");
            println!("  Directory: {}\n", model_dir.display());

            for variant in VARIANTS {
                let default_marker = if variant.name == config.model.name {
                    "  (configured)"
                } else {
                    ""
                };
                println!("  {} — {}{}", variant.name, variant.label, default_marker);
                let variant_dir = model_dir.join(variant.name);
                for file in variant.files {
                    let status = file_status(&variant_dir.join(file.local_name))?;
                    println!("    - {:20} {}", file.local_name, status.label());
                }
            }

            if find_variant(&config.model.name).is_none() {
                let variant_dir = config.variant_dir();
                println!("  {} — custom  (configured)", config.model.name);
                for name in [MODEL_FILENAME, CONFIG_FILENAME] {
                    let status = file_status(&variant_dir.join(name))?;
                    println!("    - {:20} {}", name, status.label());
                }
            }
        }

        ModelsCommand::Path => {
            println!("{}", config.variant_dir().display());
        }
    }

    Ok(())
}

/// Download every file of a variant. Skips existing files unless `force`.
async fn download_variant(
    variant: &ModelVariant,
    model_dir: &Path,
    client: &reqwest::Client,
    force: bool,
) -> anyhow::Result<()> {
    let variant_dir = model_dir.join(variant.name);
    std::fs::create_dir_all(&variant_dir)?;

    for file in variant.files {
        let dest = variant_dir.join(file.local_name);
        if dest.exists() && !force {
            tracing::info!("{} already exists at {:?}", file.local_name, dest);
            continue;
        }

        let url = format!(
            "https://huggingface.co/{}/resolve/main/{}",
            variant.repo, file.remote_path
        );
        tracing::info!("Downloading {} {}...", variant.label, file.local_name);
        tracing::info!("  Source: {}", url);
        tracing::info!("  Destination: {:?}", dest);

        let digest = download_file(client, &url, &dest).await?;
        record_digest(&dest, &digest)?;

        let file_size = std::fs::metadata(&dest)?.len();
        tracing::info!(
            "  {} complete ({:.1} MB, blake3 {}…)",
            file.local_name,
            file_size as f64 / (1024.0 * 1024.0),
            &digest[..16]
        );
    }

    Ok(())
}

/// Download a file from a URL to a local path, streaming to disk.
///
/// Writes to a `.part` file first and renames on success, so an interrupted
/// download never leaves a file that looks complete. Returns the BLAKE3
/// digest of the downloaded bytes.
async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> anyhow::Result<String> {
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;

    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| anyhow::anyhow!("Download failed: {e}"))?;

    let total_size = response.content_length();
    let pb = create_progress_bar(total_size);

    let partial = partial_path(dest);
    let mut file = tokio::fs::File::create(&partial).await?;
    let mut stream = response.bytes_stream();
    let mut hasher = blake3::Hasher::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        hasher.update(&chunk);
        pb.inc(chunk.len() as u64);
    }

    file.flush().await?;
    drop(file);
    pb.finish_and_clear();

    tokio::fs::rename(&partial, dest).await?;
    Ok(hasher.finalize().to_hex().to_string())
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

fn digest_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(DIGEST_SUFFIX);
    path.with_file_name(name)
}

fn record_digest(path: &Path, digest: &str) -> anyhow::Result<()> {
    std::fs::write(digest_path(path), format!("{digest}\n"))?;
    Ok(())
}

/// BLAKE3 hex digest of a file on disk.
fn file_digest(path: &Path) -> anyhow::Result<String> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| anyhow::anyhow!("Cannot open {}: {e}", path.display()))?;
    let mut hasher = blake3::Hasher::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize().to_hex().to_string())
}

/// Compare a file against the digest recorded when it was downloaded.
fn file_status(path: &Path) -> anyhow::Result<FileStatus> {
    if !path.exists() {
        return Ok(FileStatus::Missing);
    }
    let recorded = match std::fs::read_to_string(digest_path(path)) {
        Ok(recorded) => recorded,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(FileStatus::Unverified),
        Err(e) => return Err(e.into()),
    };

    let actual = file_digest(path)?;
    if actual == recorded.trim() {
        tracing::debug!("Checksum verified for {}: {}…", path.display(), &actual[..16]);
        Ok(FileStatus::Verified)
    } else {
        tracing::warn!(
            "Checksum mismatch for {}:\n  recorded: {}\n  actual:   {}\n\
             Re-download with `glimpse models download --force`.",
            path.display(),
            recorded.trim(),
            actual
        );
        Ok(FileStatus::Corrupt)
    }
}

/// Byte progress bar for downloads; a spinner when the size is unknown.
fn create_progress_bar(total: Option<u64>) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    match total {
        Some(total) => {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%)",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    }
}
