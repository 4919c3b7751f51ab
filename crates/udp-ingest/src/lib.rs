//! # UDP Telemetry Ingest
//!
//! A UDP ingestion service built on [`keyed_dispatch`]: datagrams carrying
//! a binary-framed telemetry packet are decoded, sharded by the device id
//! embedded in the packet header, and processed by a dedicated per-device
//! worker: serialized per device, parallel across devices.
//!
//! ## Components
//!
//! - **[`packet`]**: the binary wire format ([`Packet`](packet::Packet))
//!   and its fixed-offset codec.
//! - **[`telemetry`]**: the [`Processor`](keyed_dispatch::Processor)
//!   implementation: key extraction, endpoint naming, payload reduction.
//! - **[`ingest`]**: the UDP server feeding decoded packets to the router.
//! - **[`system`]**: configuration and lifecycle orchestration; starts the
//!   router before the server and tears both down in reverse.

pub mod ingest;
pub mod packet;
pub mod system;
pub mod telemetry;
