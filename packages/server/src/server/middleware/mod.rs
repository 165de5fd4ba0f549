pub mod session_auth;
pub mod tenant_router;

pub use session_auth::{session_auth_middleware, AuthUser};
pub use tenant_router::{tenant_router_middleware, RouteTarget, TenantRouter};
