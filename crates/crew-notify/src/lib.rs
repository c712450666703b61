//! # crew-notify
//!
//! Real-time notification fan-out for Crew.
//!
//! A [`Broadcaster`] keeps every live client connection keyed by user id and
//! pushes id-only [`Message`](crew_core::message::Message)s to them. Delivery is
//! best effort: writes never block, and a connection whose write fails is
//! dropped on the spot. Clients are expected to reconnect and re-fetch.

pub mod broadcaster;
pub mod connection;
pub mod error;

pub use broadcaster::{Broadcaster, SendReport};
pub use connection::{Connection, ConnectionId};
pub use error::NotifyError;
