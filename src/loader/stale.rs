use crate::common::ModuleError;

/// Message markers a stale deploy produces when a client requests an
/// artifact the server no longer carries. Matched case-insensitively.
pub const STALE_MESSAGE_MARKERS: [&str; 4] = [
    "failed to fetch dynamically imported module",
    "loading chunk",
    "loading css chunk",
    "chunkloaderror",
];

/// Default stale-artifact classifier: a typed missing-artifact error, or
/// an error message carrying one of the known markers.
pub fn is_stale_artifact_error(err: &ModuleError) -> bool {
    if matches!(err, ModuleError::MissingArtifact(_)) {
        return true;
    }
    let message = err.to_string().to_ascii_lowercase();
    STALE_MESSAGE_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}
