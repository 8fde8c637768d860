//! Application state for the Hyper AI browser shell: a closed set of actions,
//! a pure transition function, and a store that persists every change.

pub mod actions;
pub mod activity;
pub mod commands;
pub mod config;
pub mod logging;
pub mod models;
pub mod navigation;
pub mod records;
pub mod reducer;
pub mod storage;

pub use actions::{Action, SettingsPatch};
pub use commands::Shell;
pub use config::Config;
pub use models::AppState;
pub use reducer::{reduce, reducer, ReduceFn};
pub use storage::{AppStateStore, FileBackend, MemoryBackend, StateBackend, StorageError, STATE_KEY};
