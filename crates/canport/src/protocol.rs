// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Identifier and frame-header bit packing.
//!
//! Every frame on the wire carries a 29-bit extended CAN identifier laid out
//! as:
//!
//! ```text
//!  28    26 25  24 23       14 13      7 6       0
//! +--------+---+---+-----------+---------+---------+
//! |priority|svc|req|  port_id  |  dest   | source  |
//! |  3 bit | 1 | 1 |  10 bit   |  7 bit  |  7 bit  |
//! +--------+---+---+-----------+---------+---------+
//! ```
//!
//! and a one-byte header in front of the data payload:
//!
//! ```text
//!  7   6 5          0
//! +---+---+-----------+
//! |SOT|EOT|transfer_id|
//! +---+---+-----------+
//! ```
//!
//! Packing and unpacking are pure bit operations. Decoding masks every field
//! to its declared width; encoding expects callers to supply in-range values
//! (range validation belongs to the document model, not here).

// ============================================================================
// Priority
// ============================================================================

/// Transfer priority, encoded in the top three identifier bits.
///
/// Lower numeric value wins CAN arbitration, so `Critical` preempts
/// everything and `Optional` yields to everything.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Priority {
    Critical = 0,
    Immediate = 1,
    Fast = 2,
    High = 3,
    /// Default for application traffic.
    Nominal = 4,
    Low = 5,
    Slow = 6,
    Optional = 7,
}

impl Priority {
    /// Decode a priority from its 3-bit field, ignoring any higher bits.
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Priority::Critical,
            1 => Priority::Immediate,
            2 => Priority::Fast,
            3 => Priority::High,
            4 => Priority::Nominal,
            5 => Priority::Low,
            6 => Priority::Slow,
            _ => Priority::Optional,
        }
    }

    #[must_use]
    pub const fn into_bits(self) -> u8 {
        self as u8
    }
}

impl From<Priority> for u8 {
    fn from(value: Priority) -> Self {
        value.into_bits()
    }
}

// ============================================================================
// CAN identifier
// ============================================================================

const PRIORITY_SHIFT: u32 = 26;
const SERVICE_SHIFT: u32 = 25;
const SERVICE_REQUEST_SHIFT: u32 = 24;
const PORT_ID_SHIFT: u32 = 14;
const DESTINATION_SHIFT: u32 = 7;

const PRIORITY_MASK: u32 = 0x07;
const FLAG_MASK: u32 = 0x01;
const PORT_ID_MASK: u32 = 0x3FF;
const NODE_ID_MASK: u32 = 0x7F;

/// The packed addressing fields of a 29-bit extended CAN identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CanId {
    pub priority: Priority,
    /// Set on service (request/response) transfers. The transport never sets
    /// it and discards incoming frames that carry it.
    pub service: bool,
    /// Request/response discriminator, only meaningful when `service` is set.
    pub service_request: bool,
    pub port_id: u16,
    /// Receiving node, or [`crate::config::BROADCAST_NODE_ID`] for everyone.
    pub destination_id: u8,
    pub source_id: u8,
}

impl CanId {
    /// Pack into the 29-bit arbitration ID.
    #[must_use]
    #[inline]
    pub fn encode(&self) -> u32 {
        (u32::from(self.priority.into_bits()) << PRIORITY_SHIFT)
            | (u32::from(self.service) << SERVICE_SHIFT)
            | (u32::from(self.service_request) << SERVICE_REQUEST_SHIFT)
            | (u32::from(self.port_id) << PORT_ID_SHIFT)
            | (u32::from(self.destination_id) << DESTINATION_SHIFT)
            | u32::from(self.source_id)
    }

    /// Unpack from an arbitration ID, masking each field to its width.
    #[must_use]
    #[inline]
    pub fn decode(raw: u32) -> Self {
        Self {
            priority: Priority::from_bits(((raw >> PRIORITY_SHIFT) & PRIORITY_MASK) as u8),
            service: (raw >> SERVICE_SHIFT) & FLAG_MASK != 0,
            service_request: (raw >> SERVICE_REQUEST_SHIFT) & FLAG_MASK != 0,
            port_id: ((raw >> PORT_ID_SHIFT) & PORT_ID_MASK) as u16,
            destination_id: ((raw >> DESTINATION_SHIFT) & NODE_ID_MASK) as u8,
            source_id: (raw & NODE_ID_MASK) as u8,
        }
    }
}

// ============================================================================
// Frame header
// ============================================================================

const SOT_BIT: u8 = 7;
const EOT_BIT: u8 = 6;
const TRANSFER_ID_MASK: u8 = 0x3F;

/// First byte of every frame payload.
///
/// A single-frame transfer carries both flags set. `start != end` marks a
/// piece of a multi-frame transfer, which this transport recognizes only to
/// discard it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub start_of_transfer: bool,
    pub end_of_transfer: bool,
    /// Distinguishes successive transfers on the same port (6-bit counter).
    pub transfer_id: u8,
}

impl FrameHeader {
    /// Pack into the header byte.
    #[must_use]
    #[inline]
    pub fn encode(&self) -> u8 {
        (u8::from(self.start_of_transfer) << SOT_BIT)
            | (u8::from(self.end_of_transfer) << EOT_BIT)
            | self.transfer_id
    }

    /// Unpack from the header byte.
    #[must_use]
    #[inline]
    pub fn decode(byte: u8) -> Self {
        Self {
            start_of_transfer: byte >> SOT_BIT & 0x01 != 0,
            end_of_transfer: byte >> EOT_BIT & 0x01 != 0,
            transfer_id: byte & TRANSFER_ID_MASK,
        }
    }

    /// True when the header describes a complete transfer in one frame.
    #[must_use]
    pub fn is_single_frame(&self) -> bool {
        self.start_of_transfer && self.end_of_transfer
    }

    /// True when the header marks part of a multi-frame transfer.
    #[must_use]
    pub fn is_continuation(&self) -> bool {
        self.start_of_transfer != self.end_of_transfer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_bits_round_trip() {
        for bits in 0..=7u8 {
            assert_eq!(Priority::from_bits(bits).into_bits(), bits);
        }
        // Bits above the field width are ignored
        assert_eq!(Priority::from_bits(0x0C), Priority::Nominal);
        assert_eq!(Priority::from_bits(0xFF), Priority::Optional);
    }

    #[test]
    fn priority_ordering_matches_arbitration() {
        assert!(Priority::Critical < Priority::Nominal);
        assert!(Priority::Nominal < Priority::Optional);
    }

    #[test]
    fn can_id_encodes_known_vector() {
        let id = CanId {
            priority: Priority::Nominal,
            service: false,
            service_request: false,
            port_id: 33,
            destination_id: 5,
            source_id: 0,
        };
        // 4<<26 | 33<<14 | 5<<7
        assert_eq!(id.encode(), 0x1008_4280);
    }

    #[test]
    fn can_id_round_trips() {
        for _ in 0..1000 {
            let id = CanId {
                priority: Priority::from_bits(fastrand::u8(0..=7)),
                service: fastrand::bool(),
                service_request: fastrand::bool(),
                port_id: fastrand::u16(0..=0x3FF),
                destination_id: fastrand::u8(0..=127),
                source_id: fastrand::u8(0..=127),
            };
            assert_eq!(CanId::decode(id.encode()), id);
        }
    }

    #[test]
    fn can_id_decode_masks_every_field() {
        let id = CanId::decode(u32::MAX);
        assert_eq!(id.priority, Priority::Optional);
        assert!(id.service);
        assert!(id.service_request);
        assert_eq!(id.port_id, 0x3FF);
        assert_eq!(id.destination_id, 0x7F);
        assert_eq!(id.source_id, 0x7F);
        // Bits above the 29-bit identifier change nothing
        assert_eq!(CanId::decode(0x1FFF_FFFF), id);
    }

    #[test]
    fn single_frame_header_byte() {
        let header = FrameHeader {
            start_of_transfer: true,
            end_of_transfer: true,
            transfer_id: 0,
        };
        assert_eq!(header.encode(), 0b1100_0000);
        assert!(header.is_single_frame());
        assert!(!header.is_continuation());
    }

    #[test]
    fn header_round_trips() {
        for transfer_id in 0..=0x3Fu8 {
            for (sot, eot) in [(false, false), (false, true), (true, false), (true, true)] {
                let header = FrameHeader {
                    start_of_transfer: sot,
                    end_of_transfer: eot,
                    transfer_id,
                };
                assert_eq!(FrameHeader::decode(header.encode()), header);
            }
        }
    }

    #[test]
    fn continuation_detection() {
        assert!(FrameHeader::decode(0b1000_0001).is_continuation());
        assert!(FrameHeader::decode(0b0100_0000).is_continuation());
        assert!(!FrameHeader::decode(0b0000_0011).is_continuation());
        assert!(!FrameHeader::decode(0b1111_1111).is_continuation());
    }
}
