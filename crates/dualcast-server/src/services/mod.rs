//! Built-in dispatchers.

pub mod echo;

pub use echo::EchoService;
