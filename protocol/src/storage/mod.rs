//! Durable storage: the sled-backed mirror of registry state.

pub mod db;

pub use db::{RegistryDb, StorageError};
