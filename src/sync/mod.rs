//! Two-client state synchronization

pub mod protocol;
pub mod reconciler;

pub use reconciler::{Reconciler, RemoteHandle};
