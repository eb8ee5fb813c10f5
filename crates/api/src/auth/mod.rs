// Authentication module
//
// - config: token secrets, lifetimes and cookie flags from the environment
// - jwt: access/refresh token codec
// - credentials: account lookup, secret hashing, refresh-token digests
// - session: login, refresh rotation, logout, password change
// - middleware: AuthUser extractor (access-token gate)
// - routes: session HTTP endpoints

pub mod config;
pub mod credentials;
pub mod jwt;
pub mod middleware;
pub mod routes;
pub mod session;

pub use config::AuthConfig;
pub use middleware::{AuthState, AuthUser};
