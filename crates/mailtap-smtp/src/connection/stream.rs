//! TCP and TLS transports.

use std::sync::Arc;

use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    client::TlsStream,
    rustls::{ClientConfig, RootCertStore},
};

use crate::error::{Error, Result};

/// Encrypted transport, reached either directly or through STARTTLS.
pub type SmtpTlsStream = TlsStream<TcpStream>;

/// Opens a plain TCP connection, to be upgraded with STARTTLS.
///
/// # Errors
///
/// Returns an error if the connection fails.
pub async fn connect(hostname: &str, port: u16) -> Result<TcpStream> {
    tracing::debug!(host = %hostname, port, "connecting (plain)");
    Ok(TcpStream::connect((hostname, port)).await?)
}

/// Opens an implicit-TLS connection (usually port 465).
///
/// # Errors
///
/// Returns an error if the connection or TLS handshake fails.
pub async fn connect_tls(hostname: &str, port: u16) -> Result<SmtpTlsStream> {
    tracing::debug!(host = %hostname, port, "connecting (tls)");
    let tcp = TcpStream::connect((hostname, port)).await?;
    upgrade(tcp, hostname).await
}

/// Runs the TLS handshake over an established TCP connection.
///
/// # Errors
///
/// Returns an error if `hostname` is not a valid DNS name or the handshake
/// fails.
pub async fn upgrade(tcp: TcpStream, hostname: &str) -> Result<SmtpTlsStream> {
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::InvalidDnsName(hostname.to_string()))?;
    Ok(create_tls_connector().connect(server_name, tcp).await?)
}

/// TLS connector trusting the webpki root set.
fn create_tls_connector() -> TlsConnector {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use tokio::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn test_upgrade_rejects_bad_host_name() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let tcp = TcpStream::connect(addr).await.unwrap();

        let err = upgrade(tcp, "not a host").await.unwrap_err();
        assert!(matches!(err, Error::InvalidDnsName(ref h) if h == "not a host"));
    }
}
