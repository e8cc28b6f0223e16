//! Class label loading.
//!
//! Two layouts are understood, checked in this order:
//! - `config.json` with a Hugging Face style `id2label` map
//! - `labels.txt` with one label per line (ImageNet synset ids are stripped)

use std::path::Path;

use crate::error::PipelineError;

/// Model config filename carrying `id2label`.
pub const CONFIG_FILENAME: &str = "config.json";

/// Plain label list filename.
pub const LABELS_FILENAME: &str = "labels.txt";

/// Load class labels from a model variant directory.
pub fn load_labels(variant_dir: &Path) -> Result<Vec<String>, PipelineError> {
    let config_path = variant_dir.join(CONFIG_FILENAME);
    if config_path.exists() {
        let content = read(&config_path)?;
        return parse_id2label(&content).map_err(|message| PipelineError::ModelLoad {
            path: config_path,
            message,
        });
    }

    let labels_path = variant_dir.join(LABELS_FILENAME);
    if labels_path.exists() {
        let content = read(&labels_path)?;
        let labels = parse_label_lines(&content);
        if labels.is_empty() {
            return Err(PipelineError::ModelLoad {
                path: labels_path,
                message: "Label file is empty".to_string(),
            });
        }
        return Ok(labels);
    }

    Err(PipelineError::ModelLoad {
        path: variant_dir.to_path_buf(),
        message: format!(
            "No {} or {} found. Run `glimpse models download` first.",
            CONFIG_FILENAME, LABELS_FILENAME
        ),
    })
}

fn read(path: &Path) -> Result<String, PipelineError> {
    std::fs::read_to_string(path).map_err(|e| PipelineError::ModelLoad {
        path: path.to_path_buf(),
        message: format!("Failed to read labels: {e}"),
    })
}

/// Parse the `id2label` object of a model config into an index-ordered list.
pub(crate) fn parse_id2label(content: &str) -> Result<Vec<String>, String> {
    let config: serde_json::Value =
        serde_json::from_str(content).map_err(|e| format!("Failed to parse config JSON: {e}"))?;

    let id2label = config["id2label"]
        .as_object()
        .ok_or_else(|| "Config missing id2label field".to_string())?;

    let mut labels: Vec<(usize, String)> = Vec::with_capacity(id2label.len());
    for (key, value) in id2label {
        let idx = key
            .parse::<usize>()
            .map_err(|_| format!("Invalid class index in id2label: {key:?}"))?;
        let label = value
            .as_str()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| format!("Label for class {idx} is not a non-empty string"))?;
        labels.push((idx, label.to_string()));
    }
    labels.sort_by_key(|(idx, _)| *idx);

    if labels.iter().enumerate().any(|(pos, (idx, _))| pos != *idx) {
        return Err("id2label indices are not contiguous from 0".to_string());
    }

    Ok(labels.into_iter().map(|(_, label)| label).collect())
}

/// Parse a newline-separated label list.
pub(crate) fn parse_label_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| strip_synset_id(line).to_string())
        .collect()
}

/// `"n01440764 tench, Tinca tinca"` → `"tench, Tinca tinca"`.
fn strip_synset_id(line: &str) -> &str {
    match line.split_once(' ') {
        Some((id, rest))
            if id.len() == 9
                && id.starts_with('n')
                && id[1..].chars().all(|c| c.is_ascii_digit()) =>
        {
            rest.trim()
        }
        _ => line,
    }
}
