//! Write and read command implementations.

use anyhow::{Context, Result, bail};
use console::style;
use eepromrw::{CHUNK_SIZE, Chip, Programmer, ProgressState, TransferPlan};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;

use crate::{Cli, use_fancy_output};

/// Resolve the serial port argument.
fn get_port(cli: &Cli) -> Result<String> {
    if let Some(port) = &cli.port {
        return Ok(port.clone());
    }

    let available: Vec<String> = eepromrw::discover_ports()
        .unwrap_or_default()
        .into_iter()
        .map(|p| p.name)
        .collect();
    if available.is_empty() {
        bail!("no serial port specified (use --port or EEPROMRW_PORT)");
    }
    bail!(
        "no serial port specified (use --port or EEPROMRW_PORT); available: {}",
        available.join(", ")
    );
}

/// Resolve the chip argument.
fn get_chip(cli: &Cli) -> Result<Chip> {
    cli.chip
        .ok_or_else(|| anyhow::anyhow!("no chip specified (use --chip or EEPROMRW_CHIP)"))
}

/// Progress bar scaled by the transfer's bar divider.
fn transfer_bar(cli: &Cli, plan: TransferPlan) -> (ProgressBar, ProgressState) {
    let state = ProgressState::new(plan.chunk_count);

    let pb = if cli.quiet || !use_fancy_output() {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(state.segments().max(1) as u64);
        #[allow(clippy::unwrap_used)] // Static template string
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {percent}% {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        pb
    };

    (pb, state)
}

/// Write command implementation.
pub(crate) fn cmd_write(cli: &Cli, file: &Path) -> Result<()> {
    let chip = get_chip(cli)?;

    let image = fs::read(file)
        .with_context(|| format!("failed to read image file {}", file.display()))?;
    if image.len() > chip.capacity() {
        bail!(
            "image is {} bytes but the {} holds only {} bytes",
            image.len(),
            chip,
            chip.capacity()
        );
    }

    let port = get_port(cli)?;
    if !cli.quiet {
        eprintln!(
            "{} Writing {} ({} bytes) to a {} via {}",
            style("ℹ").blue(),
            file.display(),
            image.len(),
            chip,
            port
        );
    }

    let plan = TransferPlan::new(image.len());
    if !cli.quiet {
        eprintln!(
            "{} {} chunks of {} bytes + {} remaining",
            style("ℹ").blue(),
            plan.chunk_count,
            CHUNK_SIZE,
            plan.remainder
        );
        eprintln!("{} Opening serial port...", style("⏳").yellow());
    }

    let mut programmer = Programmer::open(&port)?;
    if !cli.quiet {
        eprintln!("{} Serial port open, starting to write...", style("✓").green());
    }

    let (pb, state) = transfer_bar(cli, plan);
    programmer.write_image(chip, &image, |done, total| {
        pb.set_position(state.filled(done) as u64);
        pb.set_message(format!("chunk {done}/{total}"));
    })?;
    pb.finish_with_message("done");

    programmer.close()?;

    if !cli.quiet {
        eprintln!("{} Write complete", style("✓").green().bold());
    }
    Ok(())
}

/// Read command implementation.
pub(crate) fn cmd_read(cli: &Cli, file: &Path, size: usize) -> Result<()> {
    let chip = get_chip(cli)?;
    if size > chip.capacity() {
        bail!(
            "requested {} bytes but the {} holds only {} bytes",
            size,
            chip,
            chip.capacity()
        );
    }

    let port = get_port(cli)?;
    if !cli.quiet {
        eprintln!(
            "{} Reading {} bytes from a {} via {} into {}",
            style("ℹ").blue(),
            size,
            chip,
            port,
            file.display()
        );
    }

    let plan = TransferPlan::new(size);
    if !cli.quiet {
        eprintln!(
            "{} {} chunks of {} bytes + {} remaining",
            style("ℹ").blue(),
            plan.chunk_count,
            CHUNK_SIZE,
            plan.remainder
        );
    }

    let mut out = fs::File::create(file)
        .with_context(|| format!("failed to create output file {}", file.display()))?;

    if !cli.quiet {
        eprintln!("{} Opening serial port...", style("⏳").yellow());
    }
    let mut programmer = Programmer::open(&port)?;
    if !cli.quiet {
        eprintln!("{} Serial port open, starting to read...", style("✓").green());
    }

    let (pb, state) = transfer_bar(cli, plan);
    programmer.read_image(chip, size, &mut out, |done, total| {
        pb.set_position(state.filled(done) as u64);
        pb.set_message(format!("chunk {done}/{total}"));
    })?;
    pb.finish_with_message("done");

    programmer.close()?;

    if !cli.quiet {
        eprintln!("{} Read complete", style("✓").green().bold());
    }
    Ok(())
}
