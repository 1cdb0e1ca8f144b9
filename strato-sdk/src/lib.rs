//! strato-sdk - client SDK for the strato resource management API.
//!
//! Exposes typed per-kind clients over HTTP, the convergence poller used to
//! wait for asynchronously provisioned resources, and the paginated iterator
//! used to enumerate resource collections.

pub mod client;
pub mod clients;
pub mod error;
pub mod pager;
pub mod poller;
pub mod resource;
pub mod types;

pub use client::ApiClient;
pub use clients::{
    InstanceClient, NetworkClient, RoleClient, TenantClient, VolumeClient, WorkspaceClient,
};
pub use error::ClientError;
pub use pager::{ListOptions, Page, PageFetcher, Pager};
pub use poller::{PollError, RetryBudget, StateCheck, converge};
pub use resource::{Metadata, Resource, StateTransition, Status, state};
