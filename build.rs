// Build script to embed the current git commit at compile time
use std::process::Command;

fn main() {
    // Short hash of HEAD, empty outside a git checkout
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output();

    let commit = match output {
        Ok(o) if o.status.success() => {
            String::from_utf8_lossy(&o.stdout).trim().to_string()
        }
        _ => String::new(),
    };

    println!("cargo:rustc-env=GIT_COMMIT_HASH={}", commit);

    // Rerun build script when git state changes
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");
}
