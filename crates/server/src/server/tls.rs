//! TLS listener setup using rustls.
//!
//! The certificate chain and private key are PEM files provisioned next to
//! the service (e.g. a mounted secret). When they are configured, every
//! accepted TCP connection is wrapped in a TLS session and handed to hyper.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto,
    service::TowerToHyperService,
};
use rustls::ServerConfig;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, error, info};

/// Build a [`rustls::ServerConfig`] from PEM-encoded certificate and private key bytes.
///
/// # Errors
///
/// Returns an error if the certificate or key cannot be parsed, or if rustls
/// rejects the configuration.
pub fn build_server_config(cert_pem: &[u8], key_pem: &[u8]) -> Result<Arc<ServerConfig>> {
    let certs = rustls_pemfile::certs(&mut std::io::BufReader::new(cert_pem))
        .collect::<Result<Vec<_>, _>>()
        .context("failed to parse TLS certificate chain")?;
    if certs.is_empty() {
        anyhow::bail!("no certificates found in PEM data");
    }

    let key = rustls_pemfile::private_key(&mut std::io::BufReader::new(key_pem))
        .context("failed to read TLS private key")?
        .context("no private key found in PEM data")?;

    let mut config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .context("failed to build rustls ServerConfig")?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    Ok(Arc::new(config))
}

/// Read the PEM files at `cert_path` and `key_path` and build a server config.
///
/// # Errors
///
/// Returns an error if either file cannot be read or parsed.
pub async fn load_server_config(cert_path: &str, key_path: &str) -> Result<Arc<ServerConfig>> {
    let cert_pem = tokio::fs::read(cert_path)
        .await
        .with_context(|| format!("failed to read TLS certificate {cert_path}"))?;
    let key_pem = zeroize::Zeroizing::new(
        tokio::fs::read(key_path)
            .await
            .with_context(|| format!("failed to read TLS private key {key_path}"))?,
    );
    build_server_config(&cert_pem, &key_pem)
}

/// Accept loop: terminate TLS on each connection and serve `router` over it.
///
/// Handshake and connection errors are logged per connection and never stop
/// the loop. When `shutdown` resolves the listener is closed, every open
/// connection is told to finish its in-flight requests, and this returns once
/// all of them have closed.
pub async fn serve<F>(
    listener: TcpListener,
    config: Arc<ServerConfig>,
    router: Router,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    let acceptor = TlsAcceptor::from(config);
    let (stop_tx, stop_rx) = watch::channel(false);
    let mut connections = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            accepted = listener.accept() => {
                let (tcp_stream, peer_addr) = match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        error!(error = %e, "accept error");
                        continue;
                    }
                };
                connections.spawn(serve_connection(
                    acceptor.clone(),
                    tcp_stream,
                    peer_addr,
                    router.clone(),
                    stop_rx.clone(),
                ));
            }
        }
    }

    drop(listener);
    info!(open_connections = connections.len(), "draining TLS connections");
    stop_tx.send_replace(true);
    while connections.join_next().await.is_some() {}
}

async fn serve_connection(
    acceptor: TlsAcceptor,
    tcp_stream: TcpStream,
    peer_addr: SocketAddr,
    router: Router,
    mut stop: watch::Receiver<bool>,
) {
    let tls_stream = match acceptor.accept(tcp_stream).await {
        Ok(s) => s,
        Err(e) => {
            debug!(%peer_addr, error = %e, "TLS handshake failed");
            return;
        }
    };

    let builder = auto::Builder::new(TokioExecutor::new());
    let conn = builder.serve_connection(TokioIo::new(tls_stream), TowerToHyperService::new(router));
    tokio::pin!(conn);

    let mut stopping = *stop.borrow();
    if stopping {
        conn.as_mut().graceful_shutdown();
    }
    loop {
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(e) = result {
                    debug!(%peer_addr, error = %e, "connection closed with error");
                }
                break;
            }
            _ = stop.changed(), if !stopping => {
                conn.as_mut().graceful_shutdown();
                stopping = true;
            }
        }
    }
}
