//! Per-kind resource clients.

mod instance;
mod network;
mod role;
mod tenant;
mod volume;
mod workspace;

pub use instance::InstanceClient;
pub use network::NetworkClient;
pub use role::RoleClient;
pub use tenant::TenantClient;
pub use volume::VolumeClient;
pub use workspace::WorkspaceClient;
