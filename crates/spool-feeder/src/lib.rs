//! One-shot activation orchestration.
//!
//! A [`Feeder`] drives a single activation end to end: resolve the inputs
//! (from the secret store or the request itself), ask the policy oracle for
//! permission, push the shares to the engine through a
//! [`spool_engine::Carrier`], decode what comes back, and either return it
//! or persist it as a new secret.
//!
//! The feeder owns its carrier for exactly one activation; the tuple
//! streamers run next to it, owned by the enclosing orchestrator.

pub mod activation;
pub mod error;
pub mod feeder;
pub mod memory;
pub mod policy;
pub mod store;

pub use activation::{Activation, ActivationInput, FeedResult, InputSource, OutputMode};
pub use error::FeedError;
pub use feeder::Feeder;
pub use memory::{MemoryPolicyOracle, MemorySecretStore};
pub use policy::{CheckRequest, ExecutionTime, PolicyError, PolicyOracle, TagRequest};
pub use store::{SecretShare, SecretStore, StoreError, Tag};
