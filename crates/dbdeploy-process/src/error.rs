use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exited with code {code}")]
    Failed { program: String, code: i32 },

    #[error("'{program}' terminated by signal")]
    Terminated { program: String },

    #[error("unbalanced quote in arguments for '{program}'")]
    UnbalancedQuote { program: String },
}
