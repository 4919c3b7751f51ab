//! # System Lifecycle & Orchestration
//!
//! Wires the pieces into a running system and manages their lifecycle.
//! Startup order matters: the router's mailbox must exist, and its task
//! must be running, before the UDP server accepts the first datagram, so
//! a decoded packet always finds a registered consumer. Shutdown is the
//! reverse and best-effort: stop the ingest loop, then let the router
//! stop every worker it owns.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;
use keyed_dispatch::{Processor, Router, RouterClient};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::ingest::IngestServer;
use crate::packet::Packet;
use crate::telemetry::INCOMING_ENDPOINT;

/// Default UDP port for telemetry ingest.
pub const DEFAULT_PORT: u16 = 6050;

/// Runtime configuration for the ingest system.
#[derive(Debug, Clone, Parser)]
#[command(name = "udp-ingest", about = "UDP telemetry ingest with per-device dispatch")]
pub struct IngestConfig {
    /// Local interface to bind the UDP socket on.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub bind: IpAddr,

    /// UDP port to listen on.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
        }
    }
}

/// A running ingest system: router plus UDP server, with the client used
/// to reach the router directly (e.g. for request/reply exchanges).
pub struct IngestSystem<P>
where
    P: Processor<Input = Packet>,
{
    /// Client for submitting packets to the router.
    pub client: RouterClient<P>,

    local_addr: SocketAddr,
    router: JoinHandle<()>,
    server: JoinHandle<()>,
}

impl<P> IngestSystem<P>
where
    P: Processor<Input = Packet>,
{
    /// Starts the router first, then binds and starts the UDP server.
    ///
    /// A bind failure aborts startup; the already-spawned router winds
    /// down on its own once the last client clone is dropped.
    pub async fn start(config: &IngestConfig, processor: P) -> io::Result<Self> {
        let (router, client) = Router::new(INCOMING_ENDPOINT, processor);
        let router = tokio::spawn(router.run());

        let addr = SocketAddr::new(config.bind, config.port);
        let server = IngestServer::bind(addr, client.clone()).await?;
        let local_addr = server.local_addr()?;
        let server = tokio::spawn(server.run());

        info!(addr = %local_addr, "ingest system started");
        Ok(Self {
            client,
            local_addr,
            router,
            server,
        })
    }

    /// The address the UDP server actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Best-effort teardown: stop the receive loop, then drop the client
    /// so the router stops every worker and exits.
    pub async fn shutdown(self) {
        info!("shutting down ingest system");

        self.server.abort();
        if let Err(e) = self.server.await {
            if !e.is_cancelled() {
                error!(error = %e, "udp server task failed");
            }
        }

        drop(self.client);
        if let Err(e) = self.router.await {
            error!(error = %e, "router task failed");
        }

        info!("ingest system stopped");
    }
}
