// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message transmission.

use std::collections::HashMap;
use std::sync::Arc;

use crate::codec::{CodecRegistry, Value};
use crate::config::{BROADCAST_NODE_ID, MAX_ENCODED_PAYLOAD_LEN};
use crate::model::{PortDirection, SystemModel};
use crate::protocol::{CanId, FrameHeader, Priority};
use crate::transport::{open_system_buses, BusHandle, BusTransport, CanFrame, TransportError};

/// Confirmation returned for a successful send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendInfo {
    pub message: String,
}

/// Sends messages into a composed system.
///
/// Owns one open handle per bus. Sending takes `&mut self`, so a
/// transmitter has a single writer by construction; wrap it in a mutex to
/// share across threads.
pub struct Transmitter {
    model: Arc<SystemModel>,
    codecs: Arc<CodecRegistry>,
    transmitter_id: u8,
    buses: HashMap<String, Box<dyn BusHandle>>,
}

impl Transmitter {
    /// Open a connection to every bus in `model`.
    ///
    /// `transmitter_id` becomes the source node ID of every emitted frame;
    /// use 0 for an endpoint that is not itself an addressable device.
    pub fn new(
        model: Arc<SystemModel>,
        codecs: Arc<CodecRegistry>,
        transport: &dyn BusTransport,
        transmitter_id: u8,
    ) -> Result<Self, TransportError> {
        let buses = open_system_buses(transport, &model)?;
        Ok(Self {
            model,
            codecs,
            transmitter_id,
            buses,
        })
    }

    #[must_use]
    pub fn transmitter_id(&self) -> u8 {
        self.transmitter_id
    }

    /// Encode `value` and put it on the wire.
    ///
    /// With `from_device` false the message is a command: it goes to one of
    /// `device_name`'s receive ports and is addressed to that device's
    /// node. With `from_device` true the caller is acting as the device
    /// itself: the port comes from the transmit table and the frame is
    /// broadcast.
    pub fn send(
        &mut self,
        device_name: &str,
        port_name: &str,
        value: &Value,
        priority: Priority,
        from_device: bool,
    ) -> Result<SendInfo, TransportError> {
        let device = self
            .model
            .device(device_name)
            .ok_or_else(|| TransportError::UnknownDevice(device_name.to_string()))?;
        let direction = if from_device {
            PortDirection::Transmit
        } else {
            PortDirection::Receive
        };
        let port = device
            .interface
            .as_ref()
            .and_then(|interface| interface.port(direction, port_name))
            .ok_or_else(|| TransportError::UnknownPort {
                device: device_name.to_string(),
                port: port_name.to_string(),
            })?;
        let destination_id = if from_device {
            BROADCAST_NODE_ID
        } else {
            device.node_id
        };

        let id = CanId {
            priority,
            service: false,
            service_request: false,
            port_id: port.port_id,
            destination_id,
            source_id: self.transmitter_id,
        };
        // transfer_id stays 0 until transfers span more than one frame
        let header = FrameHeader {
            start_of_transfer: true,
            end_of_transfer: true,
            transfer_id: 0,
        };

        let codec = self.codecs.require(&port.wire_type)?;
        let payload = codec.encode(value)?;
        if payload.len() > MAX_ENCODED_PAYLOAD_LEN {
            return Err(TransportError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_ENCODED_PAYLOAD_LEN,
            });
        }

        let mut data = Vec::with_capacity(payload.len() + 1);
        data.push(header.encode());
        data.extend_from_slice(&payload);
        let frame = CanFrame::extended(id.encode(), data);

        let handle = self.buses.get_mut(&device.bus_name).ok_or_else(|| {
            TransportError::BusIo(format!("no open connection for bus '{}'", device.bus_name))
        })?;
        handle.send(&frame)?;
        log::debug!(
            "[TX] node {} -> '{}' port '{}' (id {}, {} byte payload)",
            self.transmitter_id,
            device_name,
            port_name,
            port.port_id,
            payload.len()
        );
        Ok(SendInfo {
            message: format!("Message sent to {device_name} on port {port_name}"),
        })
    }

    /// Close every bus connection. The transmitter is unusable afterwards.
    pub fn shutdown(&mut self) {
        for handle in self.buses.values_mut() {
            handle.close();
        }
        self.buses.clear();
    }
}

impl Drop for Transmitter {
    fn drop(&mut self) {
        self.shutdown();
    }
}
