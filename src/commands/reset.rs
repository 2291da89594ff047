//! Target reset command

use cyprog_kitprog::KitProg;

pub fn run(serial: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let mut kitprog = KitProg::open(serial)?;
    kitprog.reset_target()?;
    println!("Target reset complete");
    Ok(())
}
