//! Infrastructure adapters for the core ports

pub mod credential_registry;
pub mod file_history;
pub mod fs_store;
pub mod oracle;
pub mod shell_runtime;

pub use credential_registry::JsonCredentialRegistry;
pub use file_history::FileHistory;
pub use fs_store::FsCapabilityStore;
pub use oracle::{build_oracle, Provider};
pub use shell_runtime::ShellRuntime;
