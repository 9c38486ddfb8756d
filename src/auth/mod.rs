//! Application token handling.
//!
//! Provides:
//! - HS256 JWT issuing after a Supabase access token is verified
//! - Local verification of those tokens on protected routes
//! - Bearer token extraction from request headers
//!
//! ## Design Decisions
//! - Users and passwords live in Supabase; this service stores nothing.
//! - Tokens carry `id`, `email`, `role` and expire after 7 days by default.

pub mod jwt;

pub use jwt::{bearer_token, AuthError, Claims, JwtIssuer, DEFAULT_TOKEN_TTL_SECS};
