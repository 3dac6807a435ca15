use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors reading caller-supplied input
///
/// Generators themselves never fail; these cover the files and flags the CLI
/// turns into generator contexts.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {path} as {format}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },

    #[error("Invalid location rule '{0}': expected PATH=TARGET")]
    LocationRule(String),

    #[error("No runtime recognises manifest '{0}'. Known manifests: {1}")]
    UnknownManifest(String, String),
}
