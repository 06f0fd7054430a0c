//! HTTP paths served by the auth service.
//!
//! Shared by the router, the provider redirect URLs and the client
//! library, so the three never drift apart.

/// Login entry point, followed by `/{provider}`.
pub const LOGIN: &str = "/auth/login";

/// Provider callback, followed by `/{provider}`.
pub const CALLBACK: &str = "/auth/callback";

/// Access token refresh. Also the path of the `refresh_token` cookie.
pub const REFRESH: &str = "/auth/refresh";

/// Session logout. Nested under [`REFRESH`] so the refresh token cookie
/// is sent with it.
pub const LOGOUT: &str = "/auth/refresh/logout";

/// Public verification key.
pub const VERIFICATION_KEY: &str = "/auth/verification-key";

/// Liveness probe.
pub const HEALTH: &str = "/healthz";

/// Joins a service domain, an endpoint path and a provider name:
/// `build_url("https://auth.example.com", LOGIN, "google")` gives
/// `https://auth.example.com/auth/login/google`.
#[must_use]
pub fn build_url(domain: &str, endpoint: &str, provider: &str) -> String {
    format!("{}{}/{}", domain.trim_end_matches('/'), endpoint, provider)
}
