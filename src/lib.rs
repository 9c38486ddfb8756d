//! DevNest AI backend.
//!
//! A chat gateway that answers coding questions through an OpenAI-compatible
//! provider (Groq or OpenAI), falls back to a keyword-driven template
//! responder when no provider is available, and exchanges Supabase access
//! tokens for application JWTs.

pub mod auth;
pub mod config;
pub mod dispatcher;
pub mod gateway;
pub mod integrations;
pub mod providers;
pub mod util;
