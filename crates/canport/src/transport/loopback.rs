// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process loopback transport.
//!
//! Every handle opened on the same bus name joins a shared hub; a sent
//! frame is delivered to every other member of that bus, mirroring how a
//! physical CAN segment behaves (a node does not receive its own
//! transmissions). Used by the test suites and by single-process demos.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel;
use parking_lot::Mutex;

use crate::config::MAX_FRAME_DATA_LEN;
use crate::transport::{BusHandle, BusTransport, CanFrame, TransportError};

struct Member {
    id: u64,
    tx: channel::Sender<CanFrame>,
}

#[derive(Default)]
struct Hub {
    buses: Mutex<HashMap<String, Vec<Member>>>,
    next_member: AtomicU64,
}

/// Transport whose buses exist only inside the current process.
///
/// Clones share the same hub, so cloning is how independent endpoints
/// (transmitter, receiver) get wired to the same virtual buses.
#[derive(Default, Clone)]
pub struct LoopbackTransport {
    hub: Arc<Hub>,
}

impl LoopbackTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open handles on `bus_name`.
    #[must_use]
    pub fn member_count(&self, bus_name: &str) -> usize {
        self.hub
            .buses
            .lock()
            .get(bus_name)
            .map_or(0, Vec::len)
    }
}

impl BusTransport for LoopbackTransport {
    fn open(&self, bus_name: &str, rate: u32) -> Result<Box<dyn BusHandle>, TransportError> {
        let (tx, rx) = channel::unbounded();
        let id = self.hub.next_member.fetch_add(1, Ordering::Relaxed);
        self.hub
            .buses
            .lock()
            .entry(bus_name.to_string())
            .or_default()
            .push(Member { id, tx });
        log::debug!("[LOOPBACK] opened bus '{bus_name}' at {rate} bps (member {id})");
        Ok(Box::new(LoopbackHandle {
            hub: Arc::clone(&self.hub),
            bus_name: bus_name.to_string(),
            member_id: id,
            rx,
            open: true,
        }))
    }
}

struct LoopbackHandle {
    hub: Arc<Hub>,
    bus_name: String,
    member_id: u64,
    rx: channel::Receiver<CanFrame>,
    open: bool,
}

impl BusHandle for LoopbackHandle {
    fn send(&mut self, frame: &CanFrame) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::BusIo(format!(
                "bus '{}' is closed",
                self.bus_name
            )));
        }
        if frame.data.len() > MAX_FRAME_DATA_LEN {
            return Err(TransportError::BusIo(format!(
                "frame data is {} bytes, CAN limit is {}",
                frame.data.len(),
                MAX_FRAME_DATA_LEN
            )));
        }
        let buses = self.hub.buses.lock();
        if let Some(members) = buses.get(&self.bus_name) {
            for member in members {
                // A node does not hear its own transmissions
                if member.id == self.member_id {
                    continue;
                }
                // A member racing its own close just misses the frame
                let _ = member.tx.send(frame.clone());
            }
        }
        Ok(())
    }

    fn recv(&mut self, timeout: Duration) -> Result<Option<CanFrame>, TransportError> {
        match self.rx.recv_timeout(timeout) {
            Ok(frame) => Ok(Some(frame)),
            Err(channel::RecvTimeoutError::Timeout)
            | Err(channel::RecvTimeoutError::Disconnected) => Ok(None),
        }
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        let mut buses = self.hub.buses.lock();
        if let Some(members) = buses.get_mut(&self.bus_name) {
            members.retain(|member| member.id != self.member_id);
            if members.is_empty() {
                buses.remove(&self.bus_name);
            }
        }
        log::debug!(
            "[LOOPBACK] closed bus '{}' (member {})",
            self.bus_name,
            self.member_id
        );
    }
}

impl Drop for LoopbackHandle {
    fn drop(&mut self) {
        self.close();
    }
}
