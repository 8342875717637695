//! Records the compiler version so the host can refuse a configuration
//! library built by a different rustc.

fn main() {
    println!("cargo:rerun-if-env-changed=RUSTC");
    let meta = rustc_version::version_meta().expect("query rustc version");
    println!(
        "cargo:rustc-env=SPROUT_RUSTC_VERSION={}",
        meta.short_version_string
    );
}
