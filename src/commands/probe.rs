//! Probe command implementation

pub fn run(serial: Option<&str>, size: Option<u32>) -> Result<(), Box<dyn std::error::Error>> {
    let mut flash = super::open_flash(serial, size)?;

    match flash.probe() {
        Ok(()) => {
            println!("Found flash bank:");
            println!("  Device: {}", flash.describe()?);
            println!("  Silicon id: 0x{:08x}", flash.silicon_id());
            println!("  Base:   0x{:08x}", flash.base());
            println!(
                "  Size:   {} bytes ({} KiB)",
                flash.size(),
                flash.size() / 1024
            );
            println!("  Rows:   {}", flash.sectors().len());
            Ok(())
        }
        Err(e) => {
            eprintln!("Probe failed: {}", e);
            Err(Box::new(e))
        }
    }
}
