use thiserror::Error;

#[derive(Debug, Error)]
pub enum GhError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program} {args}` exited with {code}: {stderr}")]
    Failed {
        program: &'static str,
        args: String,
        code: i32,
        stderr: String,
    },

    #[error("could not decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
