//! Host-side integration for the Overmark viewer.
//!
//! Everything the embedding host provides is modeled as a trait the shell is
//! handed: value storage, asset picking, source fetching, readiness probing.
//! This crate is intentionally UI-free; it owns the glue between those
//! contracts and the viewer core, including every fallback path.

pub mod handshake;
pub mod integration;
pub mod mutation;
pub mod picker;
pub mod store;

pub use handshake::{HandshakePhase, HostContext, HostHandshake, HostProbe, PollOutcome};
pub use integration::{effective_config, encode_data_uri, IntegrationController, SourceSelection};
pub use mutation::MutationChannel;
pub use picker::{AssetPicker, PickedAsset, PickerError};
pub use store::{MemoryValueStore, RawValueSlot, SlotValueStore, ValueStore};

// Fetching is defined at the viewer seam; hosts implement the same trait.
pub use overmark_viewer::{FetchError, SourceFetcher};
