//! The `scriptor letters` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use scriptor_core::reference::{generate, supported_letters};

pub fn execute() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Letter", "Points", "Length", "Duration"]);

    for letter in supported_letters() {
        let trace = generate(letter, 0.0, 0.0, 1.0)?;
        table.add_row(vec![
            Cell::new(letter),
            Cell::new(trace.len()),
            Cell::new(format!("{:.0}px", trace.arc_length())),
            Cell::new(format!("{:.0}ms", trace.duration_ms())),
        ]);
    }

    println!("{table}");
    Ok(())
}
