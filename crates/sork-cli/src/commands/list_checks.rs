//! List checks command implementation.

use sork_checks::all_checks;

/// Prints the names of all checks, in the order they run.
pub fn run() {
    for name in all_checks().names() {
        println!("{name}");
    }
}
