use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use regex::Regex;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::control::Command;
use crate::errors::{error, info, trace, warn, Error, ErrorKind, Result};

const SERVICE_UUID: Uuid = Uuid::from_u128(0x6e40fff0_b5a3_f393_e0a9_e50e24dcca9e);
const WRITE_CHARACTERISTIC_UUID: Uuid = Uuid::from_u128(0x6e400002_b5a3_f393_e0a9_e50e24dcca9e);
const NOTIFY_CHARACTERISTIC_UUID: Uuid = Uuid::from_u128(0x6e400003_b5a3_f393_e0a9_e50e24dcca9e);

const SCAN_DURATION: Duration = Duration::from_secs(5);

/// Matches the BlueX RF03 advertised-name convention (section 4.1): `R0`,
/// one digit, underscore, four uppercase-alphanumeric characters.
fn name_pattern() -> Regex {
    Regex::new(r"^R0\d_[0-9A-Z]{4}$").expect("static pattern is valid")
}

/// One discovered ring, named and addressed well enough to connect to later.
#[derive(Debug, Clone)]
pub struct DiscoveredRing {
    pub name: String,
    pub address: String,
    peripheral: Peripheral,
}

/// Owns the BLE adapter and, once connected, the peripheral and its two
/// characteristics. All I/O here is async; the controller it feeds stays
/// synchronous (section 5).
pub struct Link {
    adapter: Adapter,
    peripheral: Option<Peripheral>,
    write_char: Option<Characteristic>,
    notify_char: Option<Characteristic>,
    reconnect_spent: AtomicBool,
}

impl Link {
    pub async fn new() -> Result<Self> {
        let manager = Manager::new()
            .await
            .map_err(|e| Error::wrap(e, ErrorKind::Connection).with_msg("link: failed to init BLE manager"))?;

        let adapters = manager
            .adapters()
            .await
            .map_err(|e| Error::wrap(e, ErrorKind::Connection).with_msg("link: failed to list BLE adapters"))?;

        let adapter = adapters
            .into_iter()
            .next()
            .ok_or_else(|| Error::new(ErrorKind::NotFound).with_msg("link: no BLE adapter present"))?;

        Ok(Self {
            adapter,
            peripheral: None,
            write_char: None,
            notify_char: None,
            reconnect_spent: AtomicBool::new(false),
        })
    }

    /// Consumes this connection's one reconnect attempt. Returns `true` the
    /// first time it's called after a successful `connect()`, `false` on
    /// every call after that until the next successful `connect()` resets
    /// the guard. Bounds retries to at most one per disconnect event.
    pub fn take_reconnect_budget(&self) -> bool {
        !self.reconnect_spent.swap(true, Ordering::AcqRel)
    }

    /// Scans for `SCAN_DURATION`, optionally filtered to a specific MAC
    /// address, and returns every ring whose advertised name matches.
    pub async fn scan(&self, mac_filter: Option<&str>) -> Result<Vec<DiscoveredRing>> {
        let filter = ScanFilter {
            services: vec![Self::service_uuid()],
        };
        self.adapter
            .start_scan(filter)
            .await
            .map_err(|e| Error::wrap(e, ErrorKind::Network).with_msg("link: failed to start scan"))?;

        sleep(SCAN_DURATION).await;

        let peripherals = self
            .adapter
            .peripherals()
            .await
            .map_err(|e| Error::wrap(e, ErrorKind::Network).with_msg("link: failed to list peripherals"))?;

        let pattern = name_pattern();
        let mut rings = Vec::new();

        for peripheral in peripherals {
            let Ok(Some(props)) = peripheral.properties().await else {
                continue;
            };
            let Some(name) = props.local_name else {
                continue;
            };
            if !pattern.is_match(&name) {
                continue;
            }
            let address = props.address.to_string();
            if let Some(filter) = mac_filter {
                if !address.eq_ignore_ascii_case(filter) {
                    continue;
                }
            }

            rings.push(DiscoveredRing {
                name,
                address,
                peripheral,
            });
        }

        let _ = self.adapter.stop_scan().await;
        Ok(rings)
    }

    /// Connects, discovers services, and subscribes to notifications.
    pub async fn connect(&mut self, ring: DiscoveredRing) -> Result<()> {
        ring.peripheral
            .connect()
            .await
            .map_err(|e| {
                Error::wrap(e, ErrorKind::Connection)
                    .with_msg("link: failed to connect to ring")
                    .with_ctx("address", ring.address.clone())
            })?;

        ring.peripheral
            .discover_services()
            .await
            .map_err(|e| Error::wrap(e, ErrorKind::Connection).with_msg("link: failed to discover services"))?;

        let characteristics = ring.peripheral.characteristics();

        let write_char = characteristics
            .iter()
            .find(|c| c.uuid == WRITE_CHARACTERISTIC_UUID)
            .cloned()
            .ok_or_else(|| {
                Error::new(ErrorKind::Protocol)
                    .with_msg("link: ring did not expose the write characteristic")
            })?;

        let notify_char = characteristics
            .iter()
            .find(|c| c.uuid == NOTIFY_CHARACTERISTIC_UUID)
            .cloned()
            .ok_or_else(|| {
                Error::new(ErrorKind::Protocol)
                    .with_msg("link: ring did not expose the notify characteristic")
            })?;

        ring.peripheral
            .subscribe(&notify_char)
            .await
            .map_err(|e| Error::wrap(e, ErrorKind::Connection).with_msg("link: failed to subscribe to notifications"))?;

        info!(address = %ring.address, name = %ring.name, "connected to ring");

        self.peripheral = Some(ring.peripheral);
        self.write_char = Some(write_char);
        self.notify_char = Some(notify_char);
        self.reconnect_spent.store(false, Ordering::Release);
        Ok(())
    }

    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(peripheral) = self.peripheral.take() {
            if let Err(e) = peripheral.disconnect().await {
                warn!(error = %e, "link: error disconnecting, proceeding anyway");
            }
        }
        self.write_char = None;
        self.notify_char = None;
        Ok(())
    }

    pub async fn send(&self, command: Command) -> Result<()> {
        let peripheral = self
            .peripheral
            .as_ref()
            .ok_or_else(|| Error::new(ErrorKind::Invalid).with_msg("link: not connected"))?;
        let write_char = self
            .write_char
            .as_ref()
            .ok_or_else(|| Error::new(ErrorKind::Invalid).with_msg("link: not connected"))?;

        trace!(command = %command, "link: writing command");

        peripheral
            .write(write_char, &command.to_bytes(), WriteType::WithoutResponse)
            .await
            .map_err(|e| {
                Error::wrap(e, ErrorKind::Write)
                    .with_msg("link: failed to write command")
                    .with_ctx("command", command.to_string())
            })
    }

    /// Drains notification payloads until `cancel` fires, invoking `on_payload`
    /// for each. Runs for the lifetime of one connection.
    pub async fn run_notifications(
        &self,
        on_payload: mpsc::UnboundedSender<Vec<u8>>,
        cancel: CancellationToken,
    ) -> Result<()> {
        let peripheral = self
            .peripheral
            .as_ref()
            .ok_or_else(|| Error::new(ErrorKind::Invalid).with_msg("link: not connected"))?;

        let mut stream = peripheral
            .notifications()
            .await
            .map_err(|e| Error::wrap(e, ErrorKind::Network).with_msg("link: failed to open notification stream"))?;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                next = stream.next() => {
                    match next {
                        Some(notification) => {
                            if notification.uuid == NOTIFY_CHARACTERISTIC_UUID {
                                if on_payload.send(notification.value).is_err() {
                                    break;
                                }
                            }
                        }
                        None => {
                            let e = Error::new(ErrorKind::Connection).with_msg("link: notification stream ended");
                            error(&e);
                            return Err(e);
                        }
                    }
                }
            }
        }

        Ok(())
    }

    pub fn service_uuid() -> Uuid {
        SERVICE_UUID
    }
}
