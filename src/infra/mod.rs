//! Adapters implementing the application ports

pub mod in_memory;
pub mod local_fs;

pub use in_memory::InMemoryFileReader;
pub use local_fs::LocalFileReader;
