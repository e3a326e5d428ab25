//! Network time adapter.
//!
//! Implements [`ClockSync`]: bring WiFi up in station mode, run SNTP until
//! the system clock is set, then take WiFi down again. Every attempt is
//! bounded (connect timeout + SNTP timeout) and never retried here; the
//! scheduler's next daily window is the retry.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::wifi::BlockingWifi` and
//!   `esp_idf_svc::sntp::EspSntp`.
//! - **all other targets**: the host clock is already correct; the sync
//!   only validates credentials.
//!
//! Credentials are baked in at build time through `GATELOCK_WIFI_SSID` and
//! `GATELOCK_WIFI_PASSWORD`.

use log::info;

use crate::app::ports::ClockSync;
use crate::error::SyncError;

#[cfg(target_os = "espidf")]
use core::time::Duration;
#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    nvs::EspDefaultNvsPartition,
    sntp::{EspSntp, SyncStatus},
    wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};
#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(target_os = "espidf")]
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(target_os = "espidf")]
const SNTP_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(target_os = "espidf")]
const SNTP_POLL: Duration = Duration::from_millis(100);

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

pub type Ssid = heapless::String<32>;
pub type Password = heapless::String<64>;

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), SyncError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(SyncError::InvalidCredentials);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), SyncError> {
    // Empty means an open network.
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(SyncError::InvalidCredentials);
    }
    Ok(())
}

/// Validate and copy credentials into fixed-capacity strings.
pub fn credentials(
    ssid: Option<&str>,
    password: Option<&str>,
) -> Result<(Ssid, Password), SyncError> {
    let ssid = ssid.filter(|s| !s.is_empty()).ok_or(SyncError::NoCredentials)?;
    let password = password.unwrap_or("");
    validate_ssid(ssid)?;
    validate_password(password)?;

    let mut s = Ssid::new();
    s.push_str(ssid).map_err(|()| SyncError::InvalidCredentials)?;
    let mut p = Password::new();
    p.push_str(password).map_err(|()| SyncError::InvalidCredentials)?;
    Ok((s, p))
}

/// Credentials injected by `build.rs`.
pub fn build_credentials() -> Result<(Ssid, Password), SyncError> {
    credentials(option_env!("GATELOCK_WIFI_SSID"), option_env!("GATELOCK_WIFI_PASSWORD"))
}

// ───────────────────────────────────────────────────────────────
// Adapter
// ───────────────────────────────────────────────────────────────

pub struct SntpClockSync {
    creds: Result<(Ssid, Password), SyncError>,
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    attempts: u32,
}

#[cfg(not(target_os = "espidf"))]
impl Default for SntpClockSync {
    fn default() -> Self {
        Self::new()
    }
}

impl SntpClockSync {
    #[cfg(target_os = "espidf")]
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: Option<EspDefaultNvsPartition>,
    ) -> Result<Self, crate::error::Error> {
        let esp_wifi = EspWifi::new(modem, sysloop.clone(), nvs)
            .map_err(|_| crate::error::Error::Init("wifi driver"))?;
        let wifi = BlockingWifi::wrap(esp_wifi, sysloop)
            .map_err(|_| crate::error::Error::Init("wifi event loop"))?;
        Ok(Self {
            creds: build_credentials(),
            wifi,
            attempts: 0,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self::with_credentials(build_credentials())
    }

    /// Host only: use explicit credentials instead of the build-time ones.
    #[cfg(not(target_os = "espidf"))]
    pub fn with_credentials(creds: Result<(Ssid, Password), SyncError>) -> Self {
        Self { creds, attempts: 0 }
    }

    /// Sync attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[cfg(target_os = "espidf")]
    fn connect(&mut self, ssid: &Ssid, password: &Password) -> Result<(), SyncError> {
        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        self.wifi
            .set_configuration(&Configuration::Client(ClientConfiguration {
                ssid: ssid.clone(),
                password: password.clone(),
                auth_method,
                ..Default::default()
            }))
            .map_err(|_| SyncError::WifiConnectFailed)?;

        self.wifi.start().map_err(|_| SyncError::WifiConnectFailed)?;
        info!("WiFi: connecting to '{}'", ssid);
        self.wifi
            .wifi_mut()
            .connect()
            .map_err(|_| SyncError::WifiConnectFailed)?;

        let wifi = &self.wifi;
        wifi.wifi_wait_while(|| wifi.is_connected().map(|c| !c), Some(CONNECT_TIMEOUT))
            .map_err(|_| SyncError::WifiConnectFailed)?;
        wifi.wait_netif_up().map_err(|_| SyncError::WifiConnectFailed)?;
        info!("WiFi: connected");
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn wait_for_sntp(&mut self) -> Result<(), SyncError> {
        let sntp = EspSntp::new_default().map_err(|_| SyncError::SntpUnavailable)?;
        let deadline = std::time::Instant::now() + SNTP_TIMEOUT;
        while sntp.get_sync_status() != SyncStatus::Completed {
            if std::time::Instant::now() >= deadline {
                return Err(SyncError::Timeout);
            }
            std::thread::sleep(SNTP_POLL);
        }
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn disconnect(&mut self) {
        if let Err(e) = self.wifi.disconnect() {
            warn!("WiFi: disconnect failed: {:?}", e);
        }
        if let Err(e) = self.wifi.stop() {
            warn!("WiFi: stop failed: {:?}", e);
        }
    }
}

impl ClockSync for SntpClockSync {
    #[cfg(target_os = "espidf")]
    fn sync(&mut self) -> Result<(), SyncError> {
        self.attempts += 1;
        let (ssid, password) = self.creds.clone()?;

        let result = self.connect(&ssid, &password).and_then(|()| self.wait_for_sntp());
        // WiFi is only up for the duration of the sync.
        self.disconnect();

        if result.is_ok() {
            info!("SNTP: system clock set");
        }
        result
    }

    #[cfg(not(target_os = "espidf"))]
    fn sync(&mut self) -> Result<(), SyncError> {
        self.attempts += 1;
        let (ssid, _) = self.creds.clone()?;
        info!("SNTP(sim): host clock used as-is (SSID '{}')", ssid);
        Ok(())
    }
}
