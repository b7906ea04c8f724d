// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Frame reception and dispatch.
//!
//! One reader thread per bus pulls frames and filters them against the
//! model; everything accepted lands on an internal queue drained by a
//! single dispatch thread, so user callbacks run strictly one at a time and
//! in arrival order per bus. Anything that does not parse as a message for
//! this node is dropped silently, matching how CAN nodes ignore foreign
//! traffic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam::channel;

use crate::codec::{CodecError, CodecRegistry, Value};
use crate::config::{
    BROADCAST_NODE_ID, BUS_RECV_TIMEOUT, DISPATCH_RECV_TIMEOUT, DISPATCH_THREAD_NAME,
    RX_THREAD_PREFIX,
};
use crate::model::{DeviceInfo, Port, PortDirection, SystemModel};
use crate::protocol::{CanId, FrameHeader};
use crate::transport::{open_system_buses, BusHandle, BusTransport, CanFrame, TransportError};

/// Invoked for every accepted message with the source system name, the
/// sending device name, the transmit port it arrived on and the decoded
/// payload.
pub type CanCallback = Arc<dyn Fn(&str, &str, &Port, &Value) + Send + Sync>;

// ============================================================================
// Frame parsing
// ============================================================================

struct ParsedFrame {
    device: Arc<DeviceInfo>,
    port: Port,
    value: Result<Value, CodecError>,
}

/// Read-only lookup state shared by all bus reader threads.
struct ParseContext {
    codecs: Arc<CodecRegistry>,
    receiver_id: u8,
    /// bus name -> node ID -> device. Node IDs identify a device only
    /// within one bus.
    devices: HashMap<String, HashMap<u8, Arc<DeviceInfo>>>,
}

impl ParseContext {
    fn new(model: &SystemModel, codecs: Arc<CodecRegistry>, receiver_id: u8) -> Self {
        let mut devices: HashMap<String, HashMap<u8, Arc<DeviceInfo>>> = HashMap::new();
        for bus in &model.buses {
            let nodes = devices.entry(bus.name.clone()).or_default();
            for device in &bus.devices {
                nodes.insert(device.node_id, Arc::clone(device));
            }
        }
        Self {
            codecs,
            receiver_id,
            devices,
        }
    }

    /// Match one raw frame against the model. `None` means the frame is not
    /// an acceptable message for this node; only payload decoding failures
    /// survive as errors, carried inside the parsed frame.
    fn parse(&self, frame: &CanFrame, bus_name: &str) -> Option<ParsedFrame> {
        if !frame.extended {
            return None;
        }
        let id = CanId::decode(frame.arbitration_id);
        if id.destination_id != self.receiver_id && id.destination_id != BROADCAST_NODE_ID {
            return None;
        }
        // Service transfers are not handled yet
        if id.service {
            return None;
        }
        let device = self.devices.get(bus_name)?.get(&id.source_id)?;
        let interface = device.interface.as_ref()?;
        let port = interface.port_by_id(PortDirection::Transmit, id.port_id)?;
        let header = FrameHeader::decode(*frame.data.first()?);
        if header.is_continuation() {
            return None;
        }
        let value = self
            .codecs
            .require(&port.wire_type)
            .and_then(|codec| codec.decode(&frame.data[1..]));
        Some(ParsedFrame {
            device: Arc::clone(device),
            port: port.clone(),
            value,
        })
    }
}

// ============================================================================
// Worker loops
// ============================================================================

struct DispatchItem {
    device: Arc<DeviceInfo>,
    port: Port,
    value: Value,
}

fn worker_loop(
    mut handle: Box<dyn BusHandle>,
    bus_name: String,
    ctx: Arc<ParseContext>,
    stop: Arc<AtomicBool>,
    queue: channel::Sender<DispatchItem>,
) {
    while !stop.load(Ordering::Relaxed) {
        let frame = match handle.recv(BUS_RECV_TIMEOUT) {
            Ok(Some(frame)) => frame,
            Ok(None) => continue,
            Err(e) => {
                log::warn!("[RX] read error on bus '{bus_name}': {e}");
                continue;
            }
        };
        let Some(parsed) = ctx.parse(&frame, &bus_name) else {
            continue;
        };
        match parsed.value {
            Ok(value) => {
                let item = DispatchItem {
                    device: parsed.device,
                    port: parsed.port,
                    value,
                };
                // Dispatcher gone means shutdown is underway
                if queue.send(item).is_err() {
                    break;
                }
            }
            Err(e) => {
                log::warn!(
                    "[RX] undecodable payload from '{}' port '{}' on bus '{bus_name}': {e}",
                    parsed.device.name,
                    parsed.port.name
                );
            }
        }
    }
    handle.close();
}

fn consumer_loop(
    queue: &channel::Receiver<DispatchItem>,
    callback: &CanCallback,
    stop: &AtomicBool,
) {
    while !stop.load(Ordering::Relaxed) {
        match queue.recv_timeout(DISPATCH_RECV_TIMEOUT) {
            Ok(item) => {
                (callback)(
                    &item.device.source_system,
                    &item.device.name,
                    &item.port,
                    &item.value,
                );
            }
            Err(channel::RecvTimeoutError::Timeout) => {}
            Err(channel::RecvTimeoutError::Disconnected) => break,
        }
    }
}

// ============================================================================
// Receiver
// ============================================================================

enum RunState {
    Created,
    Running,
    Stopped,
}

/// Listens on every bus of a composed system and dispatches accepted
/// messages to one callback.
///
/// Restartable: [`stop`](Self::stop) tears down all threads and bus
/// connections, and a later [`start`](Self::start) builds fresh ones with
/// an empty queue.
pub struct Receiver {
    model: Arc<SystemModel>,
    codecs: Arc<CodecRegistry>,
    receiver_id: u8,
    transport: Arc<dyn BusTransport>,
    callback: CanCallback,
    state: RunState,
    stop_flag: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
    consumer: Option<JoinHandle<()>>,
}

impl Receiver {
    /// Create a receiver for `receiver_id`. Frames addressed to this node
    /// ID or broadcast are accepted; everything else is ignored. No threads
    /// run until [`start`](Self::start).
    pub fn new(
        model: Arc<SystemModel>,
        codecs: Arc<CodecRegistry>,
        transport: Arc<dyn BusTransport>,
        receiver_id: u8,
        callback: impl Fn(&str, &str, &Port, &Value) + Send + Sync + 'static,
    ) -> Self {
        Self {
            model,
            codecs,
            receiver_id,
            transport,
            callback: Arc::new(callback),
            state: RunState::Created,
            stop_flag: Arc::new(AtomicBool::new(false)),
            workers: Vec::new(),
            consumer: None,
        }
    }

    #[must_use]
    pub fn receiver_id(&self) -> u8 {
        self.receiver_id
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.state, RunState::Running)
    }

    /// Open every bus and spawn the reader and dispatch threads.
    ///
    /// Fails without side effects when already running or when any bus
    /// cannot be opened.
    pub fn start(&mut self) -> Result<(), TransportError> {
        if matches!(self.state, RunState::Running) {
            return Err(TransportError::InvalidState(
                "receiver already running".to_string(),
            ));
        }
        // All buses open before any thread spawns, so a partial open never
        // leaks readers
        let handles = open_system_buses(self.transport.as_ref(), &self.model)?;

        self.stop_flag.store(false, Ordering::Relaxed);
        let ctx = Arc::new(ParseContext::new(
            &self.model,
            Arc::clone(&self.codecs),
            self.receiver_id,
        ));
        let (queue_tx, queue_rx) = channel::unbounded::<DispatchItem>();

        for (bus_name, handle) in handles {
            let ctx = Arc::clone(&ctx);
            let stop = Arc::clone(&self.stop_flag);
            let tx = queue_tx.clone();
            let thread_name = format!("{RX_THREAD_PREFIX}-{bus_name}");
            #[allow(clippy::expect_used)] // thread spawn failure is unrecoverable
            let worker = std::thread::Builder::new()
                .name(thread_name)
                .spawn(move || worker_loop(handle, bus_name, ctx, stop, tx))
                .expect("Failed to spawn bus reader thread");
            self.workers.push(worker);
        }
        // Readers hold the only senders now; the queue disconnects when the
        // last one exits
        drop(queue_tx);

        let callback = Arc::clone(&self.callback);
        let stop = Arc::clone(&self.stop_flag);
        #[allow(clippy::expect_used)] // thread spawn failure is unrecoverable
        let consumer = std::thread::Builder::new()
            .name(DISPATCH_THREAD_NAME.to_string())
            .spawn(move || consumer_loop(&queue_rx, &callback, &stop))
            .expect("Failed to spawn dispatch thread");
        self.consumer = Some(consumer);

        self.state = RunState::Running;
        log::debug!(
            "[RX] receiver node {} started ({} bus reader(s))",
            self.receiver_id,
            self.workers.len()
        );
        Ok(())
    }

    /// Signal every thread to finish, join them and close the buses.
    /// Messages still queued but not yet dispatched are discarded.
    pub fn stop(&mut self) -> Result<(), TransportError> {
        if !matches!(self.state, RunState::Running) {
            return Err(TransportError::InvalidState(
                "receiver is not running".to_string(),
            ));
        }
        self.stop_flag.store(true, Ordering::Relaxed);
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        if let Some(consumer) = self.consumer.take() {
            let _ = consumer.join();
        }
        self.state = RunState::Stopped;
        log::debug!("[RX] receiver node {} stopped", self.receiver_id);
        Ok(())
    }
}

impl Drop for Receiver {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
        if let Some(consumer) = self.consumer.take() {
            let _ = consumer.join();
        }
    }
}
