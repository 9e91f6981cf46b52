//! The `scriptor reference` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use scriptor_core::reference::generate;

pub fn execute(letter: String, x: f64, y: f64, scale: f64, format: String) -> Result<()> {
    let trace = generate(&letter, x, y, scale)?;

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&trace)?);
        }
        _ => {
            println!(
                "Reference '{letter}': {} points, {:.1}px, {:.0}ms",
                trace.len(),
                trace.arc_length(),
                trace.duration_ms()
            );

            let mut table = Table::new();
            table.set_header(vec!["#", "x", "y", "t (ms)"]);
            for (i, p) in trace.points().iter().enumerate() {
                table.add_row(vec![
                    Cell::new(i),
                    Cell::new(format!("{:.1}", p.x)),
                    Cell::new(format!("{:.1}", p.y)),
                    Cell::new(format!("{:.0}", p.timestamp_ms)),
                ]);
            }
            println!("{table}");
        }
    }

    Ok(())
}
