//! List rules command implementation.

use queue_lint::ALL_RULES;

/// Runs the list-rules command.
pub fn run() {
    println!("Available rules:\n");
    println!("{:<10} {:<28} Description", "Code", "Name");
    println!("{}", "-".repeat(80));

    for rule in ALL_RULES {
        println!("{:<10} {:<28} {}", rule.code, rule.name, rule.description);
    }

    println!("\nEligibility:");
    println!("  Rules apply to classes conforming to ThreadSafe (or marked @ThreadSafe).");
    println!("  Structs, enums, actors, and unmarked types are skipped.");

    println!("\nConfigure via queue-lint.toml, e.g.:");
    println!("  [engine]");
    println!("  queue_wrapper_methods = [\"sync\", \"async\", \"withLock\"]");
}
