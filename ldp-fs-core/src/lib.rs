pub mod adapters;
pub mod client;
pub mod graph;
pub mod link;
pub mod metadata;
pub mod mime;
pub mod tombstone;

#[cfg(test)]
mod test_support;

pub use adapters::ldp::LdpAdapter;
pub use adapters::{AdapterError, ReadResult, StorageAdapter, StreamResult, Visibility, WriteConfig};
pub use client::{ByteStream, ClientConfig, ClientError, HttpResourceClient, ResourceClient};
pub use metadata::{Metadata, ResourceKind};
pub use mime::{ExtensionGuesser, MimeGuesser};
pub use tombstone::DeleteOutcome;
