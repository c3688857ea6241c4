//! Build script embedding version information into the binary

use std::env;

fn main() {
    set_version_info();
}

fn set_version_info() {
    // Pass version information to the build
    if let Ok(version) = env::var("CARGO_PKG_VERSION") {
        println!("cargo:rustc-env=BUILD_VERSION={version}");
    }

    if let Ok(git_hash) = std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
    {
        if git_hash.status.success() {
            let hash = String::from_utf8_lossy(&git_hash.stdout);
            println!("cargo:rustc-env=BUILD_GIT_HASH={}", hash.trim());
        }
    }

    // Build timestamp
    println!(
        "cargo:rustc-env=BUILD_TIMESTAMP={}",
        chrono::Utc::now().to_rfc3339()
    );
}
