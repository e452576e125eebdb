use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidVar { var: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Lookup request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Lookup returned status {0}")]
    Status(u16),

    #[error("Lookup response had no usable country field")]
    MalformedResponse,
}

/// Failure modes of an on-demand route-module fetch.
///
/// `MissingArtifact` is the stale-deploy signature: the manifest held in
/// memory names a fragment the current deploy no longer serves.
#[derive(Error, Debug)]
pub enum ModuleError {
    #[error("Missing build artifact: {0}")]
    MissingArtifact(String),

    #[error("{0}")]
    Import(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
