//! # Telemetry Processor
//!
//! The [`Processor`] implementation for the telemetry stream: packets are
//! sharded by device id, each device's worker lives at a hex-named
//! endpoint under the router's namespace, and processing reduces the
//! payload to a numeric reading.

use async_trait::async_trait;
use keyed_dispatch::Processor;
use tracing::{info, trace};

use crate::packet::Packet;

/// The router's inbound endpoint for the telemetry stream.
pub const INCOMING_ENDPOINT: &str = "/udp/incoming/";

/// Telemetry processing error.
///
/// Uninhabited: extracting the device id and reducing a payload cannot
/// fail. The type still satisfies the processor's error contract, so the
/// dispatch layer's failure handling applies unchanged if processing ever
/// grows a fallible step.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {}

/// Shards packets by device id and reduces each payload to a reading.
pub struct TelemetryProcessor;

#[async_trait]
impl Processor for TelemetryProcessor {
    type Key = i64;
    type Input = Packet;
    type Output = f64;
    type Error = TelemetryError;

    fn key_of(&self, packet: &Packet) -> Result<i64, TelemetryError> {
        Ok(packet.mac)
    }

    fn endpoint_of(&self, mac: &i64) -> String {
        format!("{INCOMING_ENDPOINT}{mac:012X}/")
    }

    async fn process(&self, packet: Packet) -> Result<f64, TelemetryError> {
        trace!(%packet, "start processing");

        let reading: f64 = packet.data.iter().map(|byte| f64::from(*byte)).sum();

        info!(%packet, reading, "processed");
        Ok(reading)
    }
}
