//! Transport, framing and the type-state client.

mod client;
mod framed;
mod stream;

pub use client::{Authed, Authenticated, Client, NotAuthenticated, SelectOutcome, Selected};
pub use framed::{FramedStream, MAX_LINE_LENGTH, MAX_LITERAL_SIZE};
pub use stream::{ImapStream, connect_tls, create_tls_connector};
