//! Central store for the document viewer
//!
//! One owned `StoreState`, changed only by `Store::commit` with a `Mutation`.
//! Actions cover document loading and rendering, uploads with per-file
//! progress, product metadata and the digital signature workflow.

pub mod config;
pub mod document;
pub mod error;
pub mod files;
pub mod mutation;
pub mod signature;
pub mod state;
pub mod store;

pub use config::StoreConfig;
pub use error::StoreError;
pub use files::{upload_hash, UploadOutcome};
pub use mutation::Mutation;
pub use signature::{DigitalSignatureFinish, DigitalSignatureStart};
pub use state::{DocumentState, FileState, FlowbeeState, StoreState, UploadProgress};
pub use store::Store;
