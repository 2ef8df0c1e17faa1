//! Top-level facade crate for votewire.
//!
//! Re-exports the core protocol types and the client runtime so hosts can
//! depend on a single crate.

pub mod core {
    pub use votewire_core::*;
}

pub mod client {
    pub use votewire_client::*;
}
