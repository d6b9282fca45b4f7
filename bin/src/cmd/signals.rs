//! Signals command implementation.

use sagres::signals::available_signals;

/// List the signals the registry builds from the raw feeds.
pub(crate) fn run(verbose: bool) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                     Available Signals                        ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    for info in available_signals() {
        if verbose {
            println!("  {:<22} [{:<8}] {}", info.name, info.kind.to_string(), info.description);
        } else {
            println!("  {}", info.name);
        }
    }

    if !verbose {
        println!("\nUse --verbose for kinds and descriptions.");
    }
    println!();
}
