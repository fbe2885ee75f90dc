// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "auth/mod.rs"]
pub mod auth;

#[path = "agent/mod.rs"]
pub mod agent;

#[path = "docs/docs_api.rs"]
pub mod docs;

#[path = "tools/mod.rs"]
pub mod tools;
