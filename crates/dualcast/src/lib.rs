//! Top-level facade crate for dualcast.
//!
//! Re-exports the wire codecs and the server library so users can depend on a single crate.

pub mod core {
    pub use dualcast_core::*;
}

pub mod server {
    pub use dualcast_server::*;
}
