//! [`StateStorage`](crate::ports::StateStorage) backends.
//!
//! `QNA_ESCALATION__STORAGE__BACKEND` picks one: `memory` keeps state for the
//! life of the process, `file` writes YAML under `STORAGE__PATH`.

mod file_state_storage;
mod in_memory_state_storage;

pub use file_state_storage::FileStateStorage;
pub use in_memory_state_storage::InMemoryStateStorage;
