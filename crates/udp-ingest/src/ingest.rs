//! # UDP Ingest Server
//!
//! The boundary between the network and the dispatch layer. Receives
//! datagrams, decodes each into a [`Packet`], and hands it to the router.
//! A datagram that fails to decode is logged and dropped here; it never
//! reaches the router.
//!
//! The forward carries a reply expectation purely so routing failures
//! surface in the logs; the outcome is observed from a detached task and
//! the receive loop never waits on it, so ingest keeps datagram order
//! intact on the router's mailbox.

use std::io;
use std::net::SocketAddr;

use keyed_dispatch::failsafe::fail_safe;
use keyed_dispatch::{Processor, RouterClient};
use tokio::net::UdpSocket;
use tracing::{error, info, warn};

use crate::packet::Packet;

/// Largest datagram we accept.
const MAX_DATAGRAM_SIZE: usize = 65535;

/// The UDP server feeding the telemetry router.
pub struct IngestServer<P>
where
    P: Processor<Input = Packet>,
{
    socket: UdpSocket,
    client: RouterClient<P>,
}

impl<P> IngestServer<P>
where
    P: Processor<Input = Packet>,
{
    /// Binds the ingest socket.
    ///
    /// A bind failure is a start failure: the server never becomes ready
    /// and the error propagates to the caller.
    pub async fn bind(addr: SocketAddr, client: RouterClient<P>) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        info!(addr = %socket.local_addr()?, "udp server started");
        Ok(Self { socket, client })
    }

    /// The address the socket actually bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Runs the receive loop until the owning task is stopped.
    pub async fn run(self) {
        let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];
        loop {
            match self.socket.recv_from(&mut buffer).await {
                Ok((len, peer)) => self.handle_datagram(&buffer[..len], peer),
                Err(e) => warn!(error = %e, "udp receive failed"),
            }
        }
    }

    fn handle_datagram(&self, datagram: &[u8], peer: SocketAddr) {
        let Some(packet) = Packet::from_binary(datagram) else {
            error!(%peer, len = datagram.len(), "bad packet");
            return;
        };
        info!(%peer, %packet, "received");

        // Enqueue now (preserving datagram order), observe the outcome
        // later: a routing or processing failure is worth a log line here.
        match self.client.submit(packet) {
            Ok(pending) => {
                tokio::spawn(fail_safe(async move {
                    if let Err(e) = pending.outcome().await {
                        warn!(error = %e, "unexpected dispatch failure");
                    }
                }));
            }
            Err(e) => warn!(error = %e, "router unavailable"),
        }
    }
}
