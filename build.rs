fn main() {
    // Build date for the startup log line
    let build_date = chrono::Utc::now().format("%Y-%m-%d").to_string();
    println!("cargo:rustc-env=RELIEFKIT_BUILD_DATE={}", build_date);
    println!("cargo:rerun-if-changed=build.rs");
}
