pub mod buffer;
pub mod cert_verify;
pub mod connection;
pub mod crypto;
pub mod error;
pub mod scheme;
pub mod signing;
pub mod transcript;

pub use cert_verify::{CertificateVerifySend, SendOutcome};
pub use connection::{Connection, ConnectionBuilder};
pub use error::{HandshakeError, Result};
