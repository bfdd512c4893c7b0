use thiserror::Error;

/// Fatal pipeline errors. Parse errors, resolver misses, and
/// cancellation are deliberately absent from this enum — they are not
/// fatal and never travel through the error channel.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("config: {0}")]
    Config(String),
    #[error("source io: {0}")]
    SourceIo(String),
    #[error("sink write: {0}")]
    SinkWrite(String),
}
