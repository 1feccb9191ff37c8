//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# queue-lint configuration

# Severity threshold for a failing check (error | warning | info)
# fail_on = "error"

[analyzer]
# Path substrings to exclude from analysis
exclude = [
    "Carthage/",
    "Pods/",
    ".build/",
]

[engine]
# Method names that grant queue protection to their trailing closure.
# Custom wrappers built on sync/async are auto-detected per type; list
# them here only when detection cannot see them.
queue_wrapper_methods = ["sync", "async"]

# Call-name suffixes treated as callbacks from guarded functions
callback_suffixes = ["Handler", "Callback", "Completion", "Continuation", "Block"]

# Surface calls that cannot be resolved in the same file as warnings
warn_unresolved_calls = false
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    let config_path = Path::new("queue-lint.toml");

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(config_path, DEFAULT_CONFIG)?;

    println!("Created queue-lint.toml");
    println!("\nNext steps:");
    println!("  1. Edit queue-lint.toml to configure the engine");
    println!("  2. Run: queue-lint check");

    Ok(())
}
