//! Chip and port listing commands.

use anyhow::Result;
use console::style;
use eepromrw::Chip;
use serde_json::json;

/// List supported chips.
pub(crate) fn cmd_chips(json: bool) -> Result<()> {
    if json {
        let chips: Vec<_> = Chip::ALL
            .iter()
            .map(|c| json!({ "name": c.wire_name(), "capacity": c.capacity() }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&chips)?);
        return Ok(());
    }

    println!("Supported chips:");
    for chip in Chip::ALL {
        println!(
            "  {} {} ({} KiB)",
            style("•").dim(),
            chip,
            chip.capacity() / 1024
        );
    }
    Ok(())
}

/// List available serial ports.
pub(crate) fn cmd_ports(json: bool) -> Result<()> {
    let ports = eepromrw::discover_ports()?;

    if json {
        let ports: Vec<_> = ports
            .iter()
            .map(|p| {
                json!({
                    "name": p.name,
                    "manufacturer": p.manufacturer,
                    "product": p.product,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&ports)?);
        return Ok(());
    }

    if ports.is_empty() {
        println!("No serial ports found");
        return Ok(());
    }

    println!("Available ports:");
    for p in &ports {
        match &p.product {
            Some(product) => println!("  {} {} ({product})", style("•").dim(), p.name),
            None => println!("  {} {}", style("•").dim(), p.name),
        }
    }
    Ok(())
}
