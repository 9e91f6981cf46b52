//! The `scriptor init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    if Path::new("scriptor.toml").exists() {
        println!("scriptor.toml already exists, skipping.");
    } else {
        std::fs::write("scriptor.toml", SAMPLE_CONFIG)?;
        println!("Created scriptor.toml");
    }

    std::fs::create_dir_all("catalog")?;
    let example_path = Path::new("catalog/example.toml");
    if example_path.exists() {
        println!("catalog/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_CATALOG)?;
        println!("Created catalog/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: scriptor validate --catalog catalog/example.toml");
    println!("  2. Run: scriptor reference --letter i");
    println!("  3. Run: scriptor evaluate --trace trace.json --state mastery.json --log scriptor-results/evaluations.jsonl");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# scriptor configuration

# Catalog file or directory. The builtin CP-2025 catalog is used when unset.
catalog = "catalog/example.toml"
output_dir = "./scriptor-results"

[evaluation]
resample_points = 20
min_user_points = 5

[evaluation.pressure]
ideal_center = 0.5
tolerance = 0.15
"#;

const EXAMPLE_CATALOG: &str = r#"[catalog]
id = "example"
name = "Example catalog"
description = "Two competences to get started"

[[competences]]
code = "EX-01"
name = "First downstrokes"
prerequisites = []

[competences.thresholds]
precision = 50
speed = 40
fluidity = 40
inclination = 40

[[competences]]
code = "EX-02"
name = "Round letters"
prerequisites = ["EX-01"]

[competences.thresholds]
precision = 55
speed = 45
fluidity = 45
inclination = 45
pressure = 30

[[exercises]]
id = "ex-i-l"
name = "i and l"
competence = "EX-01"

[[exercises.letters]]
letter = "i"
precision_tolerance_px = 25.0
speed_target_ms = 1500.0
inclination_angle = 60.0
points = 10

[[exercises.letters]]
letter = "l"
precision_tolerance_px = 30.0
speed_target_ms = 2200.0
inclination_angle = 85.0
points = 10

[[exercises]]
id = "ex-o-c"
name = "o and c"
competence = "EX-02"

[[exercises.letters]]
letter = "o"
precision_tolerance_px = 25.0
speed_target_ms = 1800.0
inclination_angle = 90.0
points = 15

[[exercises.letters]]
letter = "c"
precision_tolerance_px = 25.0
speed_target_ms = 1600.0
inclination_angle = 118.0
points = 15
"#;
