//! Transport layer: WebSocket stream sessions and UDP datagrams.
//!
//! Both transports decode the envelope once and hand messages to the inbound
//! pipeline together with a [`Connection`] to reply on.

pub mod connection;
pub mod datagram;
pub mod outbound;
pub mod stream;
pub mod ws;

pub use connection::{Connection, TransportKind};
pub use datagram::DatagramConnection;
pub use stream::{ConnectionState, StreamConnection};
