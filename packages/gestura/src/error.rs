use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("helper command is empty")]
    EmptyHelperCommand,

    #[error("failed to spawn helper '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("helper stdout is not piped")]
    MissingStdout,

    #[error("frame source I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed frame message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("helper reported error: {0}")]
    Helper(String),

    #[error("frame source task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
