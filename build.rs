//! Build script for compile-time configuration injection.
//!
//! Set environment variables before building the firmware:
//!
//!   GATELOCK_WIFI_SSID=MyWiFi \
//!   GATELOCK_WIFI_PASSWORD=secret123 \
//!   GATELOCK_UTC_OFFSET_MINUTES=-300 \
//!   cargo build --release --features espidf

fn main() {
    println!("cargo:rerun-if-env-changed=GATELOCK_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=GATELOCK_WIFI_PASSWORD");
    println!("cargo:rerun-if-env-changed=GATELOCK_UTC_OFFSET_MINUTES");

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
