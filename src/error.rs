use std::path::PathBuf;
use thiserror::Error;

/// Failure to turn an audio file into a sample track.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to open audio file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported audio format: {0}")]
    Probe(#[source] symphonia::core::errors::Error),
    #[error("no audio tracks found")]
    NoTrack,
    #[error("unknown sample rate")]
    UnknownSampleRate,
    #[error("failed to create audio decoder: {0}")]
    Codec(#[source] symphonia::core::errors::Error),
    #[error("failed to decode audio: {0}")]
    Decode(#[source] symphonia::core::errors::Error),
}

/// Failure of an external media tool (ffprobe, ffmpeg). Always recovered
/// with a default by the caller.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("{tool} produced unusable output: {output:?}")]
    Output { tool: String, output: String },
}
