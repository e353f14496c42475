use serde_json::Value;
use shared::{domain::Transducer, parse::truthy_text};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("input is empty")]
    Empty,
    #[error("input is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("input is not an array")]
    NotArray,
}

/// Builds transducers from a pasted JSON array of structured entries. Entries
/// without a usable id are named `transducer #N`, counting only the generated
/// names.
pub fn import_transducers(text: &str) -> Result<Vec<Transducer>, ImportError> {
    if text.trim().is_empty() {
        return Err(ImportError::Empty);
    }

    let parsed: Value = serde_json::from_str(text)?;
    let items = parsed.as_array().ok_or(ImportError::NotArray)?;

    let mut auto_id = 0;
    let transducers: Vec<Transducer> = items
        .iter()
        .map(|item| {
            let mut transducer = Transducer::from_data(item);
            if item.get("id").and_then(truthy_text).is_none() {
                auto_id += 1;
                transducer.id = format!("transducer #{auto_id}");
            }
            transducer
        })
        .collect();

    info!(count = transducers.len(), "import: loaded transducers");
    Ok(transducers)
}
