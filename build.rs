fn main() {
    println!("cargo:rerun-if-env-changed=SMARTIRON_WIFI_SSID");
    println!("cargo:rerun-if-env-changed=SMARTIRON_WIFI_PASSWORD");
    println!("cargo:rerun-if-env-changed=SMARTIRON_BROKER_URL");
    println!("cargo:rerun-if-env-changed=SMARTIRON_ACCESS_TOKEN");

    // Host builds (tests, simulation) have no ESP-IDF environment to export.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
