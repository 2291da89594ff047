//! Adapter info command

use cyprog_kitprog::KitProg;

pub fn run(serial: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let mut kitprog = KitProg::open(serial)?;
    let info = kitprog.refresh_info()?;

    println!("KitProg v{}.{:02}", info.major_version, info.minor_version);
    println!("Hardware version: {}", info.hardware_version);
    println!(
        "VTARG = {}.{:03} V",
        info.millivolts / 1000,
        info.millivolts % 1000
    );

    Ok(())
}
