//! Session store contract and the in-memory implementation.
//!
//! The Token Manager is the only consumer of [`SessionStore`]. Database
//! backed implementations live in separate crates:
//!
//! - `tokengate-auth-postgres` - PostgreSQL storage backend

pub mod memory;
pub mod session;

pub use memory::MemorySessionStore;
pub use session::SessionStore;
