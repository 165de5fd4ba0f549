// Kernel - infrastructure traits, dependency container, and test doubles

pub mod deps;
pub mod test_dependencies;
pub mod traits;

pub use deps::{CloudflareAdapter, DeliveryAdapter, ServerDeps};
pub use traits::{BaseDeliveryGateway, BaseDnsProvisioner, BaseIdentityStore};
