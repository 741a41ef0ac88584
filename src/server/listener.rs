use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::http::connection::Connection;
use crate::proxy::ProxyHandler;
use crate::server::router::Router;

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&cfg.server.listen_addr).await?;
    info!("Listening on {}", cfg.server.listen_addr);

    serve(listener, cfg).await
}

/// Accepts connections on an already bound listener until an accept fails.
pub async fn serve(listener: TcpListener, cfg: &Config) -> anyhow::Result<()> {
    let proxy = ProxyHandler::from_config(cfg);
    if let Err(e) = proxy.origin().validate() {
        tracing::warn!(error = %e, "API calls will fail until BACKEND_URL is fixed");
    }
    info!(backend = proxy.origin().as_str(), "Proxying /api/*");

    let router = Arc::new(Router::new(proxy));

    loop {
        let (socket, peer) = listener.accept().await?;
        tracing::debug!("Accepted connection from {}", peer);

        let router = Arc::clone(&router);
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, router);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}
