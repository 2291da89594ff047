//! Mass erase command implementation

pub fn run(
    serial: Option<&str>,
    size: Option<u32>,
    autoerase: Option<bool>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut flash = super::open_flash(serial, size)?;
    flash.auto_probe()?;

    if let Some(enable) = autoerase {
        flash.set_autoerase(enable);
    }

    match flash.mass_erase() {
        Ok(()) => {
            println!("psoc mass erase complete");
            Ok(())
        }
        Err(e) => {
            eprintln!("psoc mass erase failed: {}", e);
            Err(Box::new(e))
        }
    }
}
