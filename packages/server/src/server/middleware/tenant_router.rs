// Host-based tenant routing.
//
// Every request passes through here before any application logic. A
// request for `{slug}.{base_domain}` is rewritten to the tenant-site
// namespace; the apex, `www`, API/auth/admin paths, and anything
// malformed fall through to the main application. Routing never
// errors: a broken Host header fails open to the default site.

use std::sync::Arc;

use axum::extract::{Extension, Request};
use axum::http::{header::HOST, Uri};
use axum::middleware::Next;
use axum::response::Response;

/// Where an inbound request should land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    MainApp,
    TenantSite { slug: String, rewritten_path: String },
}

/// Paths that bypass tenant resolution entirely: API and auth
/// surfaces, health checks, and already-namespaced tenant paths.
const BYPASS_PREFIXES: &[&str] = &[
    "/api/",
    "/health",
    "/favicon.ico",
    "/admin",
    "/auth/",
    "/onboarding",
    "/tenant-site/",
];

#[derive(Debug, Clone)]
pub struct TenantRouter {
    base_domain: String,
    /// Leading label of the base domain; `{apex}.{base}` is reserved
    /// and routes to the main app just like `www`.
    apex_label: String,
}

impl TenantRouter {
    pub fn new(base_domain: impl Into<String>) -> Self {
        let base_domain = base_domain.into().to_ascii_lowercase();
        let apex_label = base_domain
            .split('.')
            .next()
            .unwrap_or_default()
            .to_string();
        Self {
            base_domain,
            apex_label,
        }
    }

    fn is_bypass_path(path: &str) -> bool {
        BYPASS_PREFIXES.iter().any(|p| path.starts_with(p))
    }

    /// Map a Host header and request path to a routing target.
    pub fn resolve(&self, host: &str, path: &str) -> RouteTarget {
        if Self::is_bypass_path(path) {
            return RouteTarget::MainApp;
        }

        // Ports never participate in label matching.
        let hostname = host
            .split(':')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if hostname.is_empty() || hostname == self.base_domain {
            return RouteTarget::MainApp;
        }

        if let Some(labels) = hostname.strip_suffix(&format!(".{}", self.base_domain)) {
            let slug = labels.split('.').next().unwrap_or_default();
            if slug.is_empty() || slug == "www" || slug == self.apex_label {
                return RouteTarget::MainApp;
            }
            return RouteTarget::TenantSite {
                slug: slug.to_string(),
                rewritten_path: format!("/tenant-site/{slug}{path}"),
            };
        }

        // Local development: `acme.dev.localhost` style hosts with more
        // than two labels treat the first label as the slug.
        if hostname.contains("localhost") {
            let labels: Vec<&str> = hostname.split('.').collect();
            if labels.len() > 2 && !labels[0].is_empty() {
                let slug = labels[0];
                return RouteTarget::TenantSite {
                    slug: slug.to_string(),
                    rewritten_path: format!("/tenant-site/{slug}{path}"),
                };
            }
        }

        // Unknown or malformed hosts fail open to the main app.
        RouteTarget::MainApp
    }
}

/// Axum middleware that rewrites tenant-site requests before routing.
pub async fn tenant_router_middleware(
    Extension(router): Extension<Arc<TenantRouter>>,
    mut request: Request,
    next: Next,
) -> Response {
    let host = request
        .headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let path = request.uri().path().to_string();

    if let RouteTarget::TenantSite {
        slug,
        rewritten_path,
    } = router.resolve(&host, &path)
    {
        let query = request
            .uri()
            .query()
            .map(|q| format!("?{q}"))
            .unwrap_or_default();

        // An unparseable rewrite falls open to the original URI.
        if let Ok(uri) = format!("{rewritten_path}{query}").parse::<Uri>() {
            tracing::debug!(slug, path = %rewritten_path, "rewrote request to tenant site");
            *request.uri_mut() = uri;
        }
    }

    next.run(request).await
}
