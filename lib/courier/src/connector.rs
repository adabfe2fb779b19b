//! TLS-capable connector backing [`HyperTransport`](crate::HyperTransport).

use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use rustls::{ClientConfig, RootCertStore};

use crate::TransportConfig;

/// The bundled Mozilla root certificates.
fn bundled_roots() -> RootCertStore {
    webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect()
}

/// Client TLS settings trusting [`bundled_roots`].
fn tls_client_config() -> ClientConfig {
    ClientConfig::builder()
        .with_root_certificates(bundled_roots())
        .with_no_client_auth()
}

/// Build the connector used by the connection pool.
///
/// Both `http://` and `https://` addresses are accepted, with HTTP/1.1 and HTTP/2
/// negotiated over TLS. Dialing gives up after [`TransportConfig::connect_timeout`].
#[must_use]
pub fn https_connector(config: &TransportConfig) -> HttpsConnector<HttpConnector> {
    let mut tcp = HttpConnector::new();
    // the TLS layer handles the scheme check
    tcp.enforce_http(false);
    tcp.set_connect_timeout(Some(config.connect_timeout));

    HttpsConnectorBuilder::new()
        .with_tls_config(tls_client_config())
        .https_or_http()
        .enable_http1()
        .enable_http2()
        .wrap_connector(tcp)
}
