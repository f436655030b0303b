use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use hopward_cache::Cache;
use hopward_resolver::IterativeResolver;
use hopward_server::handler::DnsHandler;
use hopward_server::{spawn_cache_sweep, TcpServer, UdpServer};

/// Starts the resolver: binds UDP and TCP, wires the cache and resolver
/// into the shared request handler, and runs until a shutdown signal
/// arrives.
#[derive(Args, Debug)]
pub struct Command;

impl Command {
    pub async fn run(&self, config_path: &Path) -> i32 {
        let config = match crate::config::Config::load(config_path) {
            Ok(config) => config,
            Err(error) => {
                tracing::error!(?error, "unable to load configuration");
                return 1;
            }
        };

        let cache_path = PathBuf::from(&config.cache_file);
        let cache = Arc::new(Cache::load(&cache_path, config.cache_size));
        let resolver = Arc::new(IterativeResolver::new(
            config.proxy_hostname.clone(),
            config.proxy_port,
        ));
        let handler = Arc::new(DnsHandler::new(cache.clone(), resolver));

        let address: std::net::SocketAddr = match config.bind_address().parse() {
            Ok(address) => address,
            Err(error) => {
                tracing::error!(?error, address = %config.bind_address(), "invalid bind address");
                return 1;
            }
        };

        let udp = UdpServer::new(address, handler.clone(), config.max_threads);
        let tcp = TcpServer::new(address, handler, config.max_threads);
        let _sweep = spawn_cache_sweep(cache.clone());

        tracing::info!(%address, "starting hopward");

        let exit_code = tokio::select! {
            result = udp.run() => {
                tracing::error!(?result, "udp server stopped");
                1
            }
            result = tcp.run() => {
                tracing::error!(?result, "tcp server stopped");
                1
            }
            _ = shutdown_signal() => {
                tracing::info!("shutting down");
                0
            }
        };

        if let Err(error) = cache.save(&cache_path) {
            tracing::warn!(?error, "failed to snapshot cache on shutdown");
        }

        exit_code
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
