//! `dbdeploy-process` — runs the external deployment tools as subprocesses.
//!
//! ```text
//! CommandLine     ← program + argument string, secrets masked when rendered
//!     │
//!     ▼
//! ProcessRunner   ← capability trait; TokioRunner spawns, tests record
//!     │
//!     ▼
//! Result<()>      ← Ok only on exit code 0
//! ```

pub mod command;
pub mod error;
pub mod process;

pub use command::{split_args, CommandLine};
pub use error::ProcessError;
pub use process::{ProcessRunner, TokioRunner};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, ProcessError>;
