// syrlink-api: Async Rust client for the SYR Connect cloud API
// (AES-CBC encrypted XML command protocol)

pub mod checksum;
pub mod client;
pub mod crypto;
pub mod error;
pub mod parser;
pub mod payload;
pub mod transport;
pub mod value;

pub use client::{Credentials, SESSION_LIFETIME, Session, SessionState, SyrClient};
pub use error::Error;
