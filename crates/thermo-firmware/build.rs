//! Bakes Wi-Fi credentials from `.env` (or the build environment) into the
//! firmware image.

fn main() {
    // A missing .env is fine; the variables may come from the shell instead.
    let _ = dotenvy::dotenv();

    for key in ["WIFI_SSID", "WIFI_PASSWORD"] {
        println!("cargo:rerun-if-env-changed={key}");
        match std::env::var(key) {
            Ok(value) => println!("cargo:rustc-env={key}={value}"),
            Err(_) => println!("cargo:warning={key} is not set; the device will stay offline"),
        }
    }
    println!("cargo:rerun-if-changed=.env");
    println!("cargo:rustc-link-arg=-Tlinkall.x");
}
