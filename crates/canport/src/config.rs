// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Global protocol constants and runtime configuration.
//!
//! Centralizes the numeric contract of the wire protocol (identifier ranges,
//! frame sizing) and the runtime knobs (thread timeouts, environment variable
//! names) so nothing is scattered as magic numbers through the crate.

use std::time::Duration;

// ============================================================================
// Identifier ranges
// ============================================================================

/// Lowest node ID a device may be assigned. ID 0 is the broadcast address.
pub const NODE_ID_MIN: u8 = 1;

/// Highest node ID a device may be assigned (7-bit field).
pub const NODE_ID_MAX: u8 = 127;

/// Destination ID meaning "every node on the bus".
pub const BROADCAST_NODE_ID: u8 = 0;

/// Upper bound of the reserved protocol port-ID range `[0, 32]`.
///
/// Protocol ports are never auto-assigned and interface documents may not
/// claim them explicitly.
pub const PROTOCOL_PORT_ID_MAX: u16 = 32;

/// First port ID available to interface documents.
pub const CUSTOM_PORT_ID_MIN: u16 = 33;

/// Last port ID available to interface documents (10-bit field).
pub const CUSTOM_PORT_ID_MAX: u16 = 511;

/// Bit rates a bus declaration may use, in bit/s.
pub const SUPPORTED_BUS_RATES: [u32; 7] = [
    125_000, 250_000, 500_000, 1_000_000, 2_000_000, 3_000_000, 5_000_000,
];

// ============================================================================
// Framing
// ============================================================================

/// Classic CAN data field limit, in bytes. The frame header occupies one of
/// them, so encoded payloads may use at most [`MAX_ENCODED_PAYLOAD_LEN`].
pub const MAX_FRAME_DATA_LEN: usize = 8;

/// Largest encoded payload that fits a single classic CAN frame.
pub const MAX_ENCODED_PAYLOAD_LEN: usize = MAX_FRAME_DATA_LEN - 1;

// ============================================================================
// Receiver runtime
// ============================================================================

/// How long a bus worker blocks in one read call.
///
/// Liveness knob only: bounds how long a worker can go without observing the
/// stop flag. Correctness never depends on this value.
pub const BUS_RECV_TIMEOUT: Duration = Duration::from_millis(100);

/// How long the dispatcher blocks in one queue pop. Same liveness role as
/// [`BUS_RECV_TIMEOUT`].
pub const DISPATCH_RECV_TIMEOUT: Duration = Duration::from_millis(10);

/// Name prefix for per-bus reader threads (`canport-rx-<bus>`).
pub const RX_THREAD_PREFIX: &str = "canport-rx";

/// Name of the single callback dispatcher thread.
pub const DISPATCH_THREAD_NAME: &str = "canport-dispatch";

// ============================================================================
// Environment
// ============================================================================

/// Environment variable listing topology document directories, separated by
/// the platform path separator.
pub const ENV_SYSTEM_PATHS: &str = "CANPORT_SYSTEM_PATHS";

/// Environment variable listing interface document directories, separated by
/// the platform path separator.
pub const ENV_INTERFACE_PATHS: &str = "CANPORT_INTERFACE_PATHS";
