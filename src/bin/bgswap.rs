//! bgswap command-line tool
//!
//! Background removal, background replacement and subject mask generation
//! built on the bgswap library.

#[cfg(feature = "cli")]
use bgswap::cli;

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    cli::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Please rebuild with --features cli");
    std::process::exit(1);
}
