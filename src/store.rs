// WHY: prediction must not depend on the training corpus, so everything the classifier needs
// travels in one versioned JSON payload

use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::classifier::ClassifierModel;
use crate::error::{EndLinesError, Result};

/// Format tag written into every payload
pub const MODEL_FORMAT: &str = "endlines-model";

/// Bump when the payload layout changes incompatibly
pub const SCHEMA_VERSION: u64 = 1;

#[derive(Serialize)]
struct Envelope<'a> {
    format: &'a str,
    schema_version: u64,
    model: &'a ClassifierModel,
}

/// Serialize a model into its persisted JSON form
pub fn to_json(model: &ClassifierModel) -> Result<String> {
    let envelope = Envelope {
        format: MODEL_FORMAT,
        schema_version: SCHEMA_VERSION,
        model,
    };
    Ok(serde_json::to_string_pretty(&envelope).map_err(std::io::Error::from)?)
}

/// Parse and validate a persisted model
///
/// Either a fully valid model is returned or an error; nothing is half-loaded.
pub fn from_json(payload: &str) -> Result<ClassifierModel> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| EndLinesError::Deserialization(format!("payload is not valid JSON: {e}")))?;

    let format = value.get("format").and_then(Value::as_str);
    if format != Some(MODEL_FORMAT) {
        return Err(EndLinesError::Deserialization(format!(
            "unexpected format tag {format:?}, expected \"{MODEL_FORMAT}\""
        )));
    }

    match value.get("schema_version").and_then(Value::as_u64) {
        Some(SCHEMA_VERSION) => {}
        Some(other) => {
            return Err(EndLinesError::Deserialization(format!(
                "unsupported schema version {other}, this build reads version {SCHEMA_VERSION}"
            )));
        }
        None => {
            return Err(EndLinesError::Deserialization(
                "missing or non-integer schema_version".to_string(),
            ));
        }
    }

    let model_value = value
        .get("model")
        .ok_or_else(|| EndLinesError::Deserialization("missing model section".to_string()))?;

    let model: ClassifierModel = serde::Deserialize::deserialize(model_value)
        .map_err(|e| EndLinesError::Deserialization(format!("malformed model: {e}")))?;

    model
        .validate()
        .map_err(|e| EndLinesError::Deserialization(format!("invalid model parameters: {e}")))?;

    Ok(model)
}

/// Write the model to `destination`, replacing any existing file atomically
pub fn save(model: &ClassifierModel, destination: impl AsRef<Path>) -> Result<()> {
    let destination = destination.as_ref();
    let payload = to_json(model)?;

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let staging = staging_path(destination);
    if let Err(e) = fs::write(&staging, &payload).and_then(|_| fs::rename(&staging, destination)) {
        let _ = fs::remove_file(&staging);
        return Err(e.into());
    }

    info!(path = %destination.display(), bytes = payload.len(), "Saved model");
    Ok(())
}

/// Read a model saved with [`save`]
pub fn load(source: impl AsRef<Path>) -> Result<ClassifierModel> {
    let source = source.as_ref();
    let payload = fs::read_to_string(source)?;
    let model = from_json(&payload)?;
    info!(path = %source.display(), "Loaded model");
    Ok(model)
}

/// Async variant of [`save`]
pub async fn save_async(model: &ClassifierModel, destination: impl AsRef<Path>) -> Result<()> {
    let destination = destination.as_ref();
    let payload = to_json(model)?;

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let staging = staging_path(destination);
    let written = match tokio::fs::write(&staging, &payload).await {
        Ok(()) => tokio::fs::rename(&staging, destination).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(e.into());
    }

    info!(path = %destination.display(), bytes = payload.len(), "Saved model");
    Ok(())
}

/// Async variant of [`load`]
pub async fn load_async(source: impl AsRef<Path>) -> Result<ClassifierModel> {
    let source = source.as_ref();
    let payload = tokio::fs::read_to_string(source).await?;
    let model = from_json(&payload)?;
    info!(path = %source.display(), "Loaded model");
    Ok(model)
}

/// Sibling file the payload is written to before the rename
fn staging_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "model".into());
    name.push(".tmp");
    let staging = destination.with_file_name(name);
    debug!(staging = %staging.display(), "Staging model payload");
    staging
}
