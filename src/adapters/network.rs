//! WiFi station + MQTT session adapter.
//!
//! Implements [`ConnectivityPort`].  Remote commands arrive on the MQTT
//! RPC topic from the client's callback context and are parked in a
//! [`Mailbox`]; the control loop takes them at the start of the next
//! cycle.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspWifi` + `EspMqttClient` from `esp_idf_svc`.
//! - **all other targets**: link/session flags driven by `sim_*` methods.
//!
//! ## Reconnection policy
//!
//! While the link is down a join is attempted at most once per
//! `reconnect_interval_ms`.  The MQTT client reconnects on its own once
//! the link is back.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::{debug, info, warn};

use crate::app::commands::RemoteCommand;
use crate::app::events::TelemetryData;
use crate::app::ports::ConnectivityPort;
use crate::config::NetworkConfig;
use crate::error::{CommandError, CommsError};

use super::time::UptimeClock;

#[cfg(target_os = "espidf")]
use core::sync::atomic::{AtomicBool, Ordering};
#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};
#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{ClientConfiguration, Configuration, EspWifi};

pub const RPC_REQUEST_TOPIC: &str = "v1/devices/me/rpc/request/+";
pub const TELEMETRY_TOPIC: &str = "v1/devices/me/telemetry";

#[cfg(target_os = "espidf")]
const CLIENT_ID: &str = "smartiron";

// ───────────────────────────────────────────────────────────────
// Command mailbox
// ───────────────────────────────────────────────────────────────

/// Single-slot hand-off between the MQTT callback and the control loop.
/// A newer command overwrites one that has not been taken yet.
pub struct Mailbox {
    slot: Signal<CriticalSectionRawMutex, RemoteCommand>,
}

impl Mailbox {
    pub const fn new() -> Self {
        Self {
            slot: Signal::new(),
        }
    }

    pub fn deliver(&self, cmd: RemoteCommand) {
        self.slot.signal(cmd);
    }

    /// Decode an RPC payload and park it.  Undecodable payloads are dropped.
    pub fn deliver_payload(&self, payload: &[u8]) -> Result<RemoteCommand, CommandError> {
        match RemoteCommand::from_json(payload) {
            Ok(cmd) => {
                debug!("Mailbox: {:?}", cmd);
                self.deliver(cmd);
                Ok(cmd)
            }
            Err(e) => {
                warn!("Mailbox: dropped RPC payload ({})", e);
                Err(e)
            }
        }
    }

    pub fn try_take(&self) -> Option<RemoteCommand> {
        self.slot.try_take()
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

/// Mailbox fed by the MQTT client callback.
pub static REMOTE_MAILBOX: Mailbox = Mailbox::new();

#[cfg(target_os = "espidf")]
static SESSION_UP: AtomicBool = AtomicBool::new(false);

// ───────────────────────────────────────────────────────────────
// Adapter
// ───────────────────────────────────────────────────────────────

pub struct NetworkAdapter {
    config: NetworkConfig,
    mailbox: &'static Mailbox,
    clock: UptimeClock,
    reconnect_interval_us: u64,
    last_join_us: Option<u64>,
    join_attempts: u32,

    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,
    #[cfg(target_os = "espidf")]
    mqtt: Option<EspMqttClient<'static>>,
    #[cfg(target_os = "espidf")]
    subscribed: bool,

    #[cfg(not(target_os = "espidf"))]
    sim_link: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_session: bool,
    #[cfg(not(target_os = "espidf"))]
    sim_published: std::vec::Vec<std::vec::Vec<u8>>,
}

impl NetworkAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(
        config: NetworkConfig,
        reconnect_interval_ms: u32,
        mailbox: &'static Mailbox,
        wifi: EspWifi<'static>,
    ) -> Self {
        Self {
            config,
            mailbox,
            clock: UptimeClock::new(),
            reconnect_interval_us: u64::from(reconnect_interval_ms) * 1_000,
            last_join_us: None,
            join_attempts: 0,
            wifi,
            mqtt: None,
            subscribed: false,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(config: NetworkConfig, reconnect_interval_ms: u32, mailbox: &'static Mailbox) -> Self {
        Self {
            config,
            mailbox,
            clock: UptimeClock::new(),
            reconnect_interval_us: u64::from(reconnect_interval_ms) * 1_000,
            last_join_us: None,
            join_attempts: 0,
            sim_link: false,
            sim_session: false,
            sim_published: std::vec::Vec::new(),
        }
    }

    /// WiFi joins attempted so far.
    pub fn join_attempts(&self) -> u32 {
        self.join_attempts
    }

    fn join_due(&self, now_us: u64) -> bool {
        match self.last_join_us {
            None => true,
            Some(last) => now_us.saturating_sub(last) >= self.reconnect_interval_us,
        }
    }

    fn try_join(&mut self) {
        if !self.config.has_credentials() {
            return;
        }
        let now = self.clock.uptime_us();
        if !self.join_due(now) {
            return;
        }
        self.last_join_us = Some(now);
        self.join_attempts = self.join_attempts.wrapping_add(1);
        info!(
            "Network: joining '{}' (attempt {})",
            self.config.wifi_ssid, self.join_attempts
        );
        if let Err(e) = self.platform_join() {
            warn!("Network: join failed ({})", e);
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_join(&mut self) -> Result<(), CommsError> {
        if !self.wifi.is_started().unwrap_or(false) {
            let client = ClientConfiguration {
                ssid: self
                    .config
                    .wifi_ssid
                    .as_str()
                    .try_into()
                    .map_err(|_| CommsError::WifiConnectFailed)?,
                password: self
                    .config
                    .wifi_password
                    .as_str()
                    .try_into()
                    .map_err(|_| CommsError::WifiConnectFailed)?,
                ..Default::default()
            };
            self.wifi
                .set_configuration(&Configuration::Client(client))
                .map_err(|_| CommsError::WifiConnectFailed)?;
            self.wifi.start().map_err(|_| CommsError::WifiConnectFailed)?;
        }
        // Non-blocking; association is observed through `link_up`.
        self.wifi.connect().map_err(|_| CommsError::WifiConnectFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_join(&mut self) -> Result<(), CommsError> {
        debug!("Network(sim): join requested");
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_link_up(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_link_up(&self) -> bool {
        self.sim_link
    }

    #[cfg(target_os = "espidf")]
    fn platform_session_up(&self) -> bool {
        self.mqtt.is_some() && SESSION_UP.load(Ordering::Acquire)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_session_up(&self) -> bool {
        self.sim_link && self.sim_session
    }

    /// Bring up the MQTT client once and keep the RPC subscription alive.
    #[cfg(target_os = "espidf")]
    fn service_session(&mut self) {
        if self.mqtt.is_none() {
            let conf = MqttClientConfiguration {
                client_id: Some(CLIENT_ID),
                username: Some(self.config.access_token.as_str()),
                ..Default::default()
            };
            let mailbox = self.mailbox;
            let client = EspMqttClient::new_cb(self.config.broker_url.as_str(), &conf, move |event| {
                match event.payload() {
                    EventPayload::Connected(_) => SESSION_UP.store(true, Ordering::Release),
                    EventPayload::Disconnected => SESSION_UP.store(false, Ordering::Release),
                    EventPayload::Received { data, .. } => {
                        let _ = mailbox.deliver_payload(data);
                    }
                    _ => {}
                }
            });
            match client {
                Ok(c) => {
                    info!("Network: MQTT client started ({})", self.config.broker_url);
                    self.mqtt = Some(c);
                }
                Err(e) => {
                    warn!("Network: MQTT client init failed ({})", e);
                    return;
                }
            }
        }

        let up = SESSION_UP.load(Ordering::Acquire);
        if !up {
            self.subscribed = false;
        } else if !self.subscribed {
            if let Some(client) = self.mqtt.as_mut() {
                match client.subscribe(RPC_REQUEST_TOPIC, QoS::AtMostOnce) {
                    Ok(_) => {
                        info!("Network: subscribed to {}", RPC_REQUEST_TOPIC);
                        self.subscribed = true;
                    }
                    Err(e) => warn!("Network: subscribe failed ({})", e),
                }
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn service_session(&mut self) {}

    #[cfg(target_os = "espidf")]
    fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        let client = self.mqtt.as_mut().ok_or(CommsError::NotConnected)?;
        client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .map(|_| ())
            .map_err(|_| CommsError::MqttPublishFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), CommsError> {
        debug!("Network(sim): publish {} ({} bytes)", topic, payload.len());
        self.sim_published.push(payload.to_vec());
        Ok(())
    }

    // ── Simulation controls ───────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_link(&mut self, up: bool) {
        self.sim_link = up;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_session(&mut self, up: bool) {
        self.sim_session = up;
    }

    /// Telemetry payloads published so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_published(&self) -> &[std::vec::Vec<u8>] {
        &self.sim_published
    }
}

// ───────────────────────────────────────────────────────────────
// ConnectivityPort
// ───────────────────────────────────────────────────────────────

impl ConnectivityPort for NetworkAdapter {
    fn poll(&mut self) {
        if self.platform_link_up() {
            self.service_session();
        } else {
            self.try_join();
        }
    }

    fn link_up(&self) -> bool {
        self.platform_link_up()
    }

    fn session_up(&self) -> bool {
        self.platform_session_up()
    }

    fn take_command(&mut self) -> Option<RemoteCommand> {
        self.mailbox.try_take()
    }

    fn publish_telemetry(&mut self, data: &TelemetryData) -> Result<(), CommsError> {
        if !self.platform_session_up() {
            return Err(CommsError::NotConnected);
        }
        let payload = serde_json::to_vec(data).map_err(|_| CommsError::PayloadTooLarge)?;
        self.platform_publish(TELEMETRY_TOPIC, &payload)
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
