//! List commands implementation

use crate::programmers::available_programmers;

/// List all supported programmers
pub fn list_programmers() {
    println!("Supported programmers:");
    println!();

    for p in available_programmers() {
        if p.aliases.is_empty() {
            println!("  {:10} - {}", p.name, p.description);
        } else {
            println!(
                "  {:10} - {} (aliases: {})",
                p.name,
                p.description,
                p.aliases.join(", ")
            );
        }
    }
}
