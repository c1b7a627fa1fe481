//! Demonstrates instrumenting a small simulation with nested regions and dumping the
//! resulting report to the console and to a file.
//!
//! Run with: `cargo run --example cycle_tree_basic`.
#![expect(
    clippy::indexing_slicing,
    reason = "this is example code that does not need production-level safety"
)]

use std::hint::black_box;

use cycle_tree::{DEFAULT_CALIBRATION_WINDOW, Error, Profiler};

fn main() -> Result<(), Error> {
    let profiler = Profiler::new();

    let calibration = profiler.initialize(DEFAULT_CALIBRATION_WINDOW);
    match calibration.cycles_per_second() {
        Some(cycles_per_second) => println!(
            "Cycle counter runs at {:.2} GHz",
            cycles_per_second / 1.0e9
        ),
        None => println!("Cycle counter did not advance, seconds will not be shown"),
    }
    println!();

    let frame = profiler.register("frame")?;
    let physics = profiler.register("physics")?;
    let collisions = profiler.register("collisions")?;
    let render = profiler.register("render")?;

    let mut positions: Vec<f64> = (0..10_000_i32).map(f64::from).collect();

    for _ in 0..100 {
        let _frame = profiler.enter(frame)?;

        {
            let _physics = profiler.enter(physics)?;

            for position in &mut positions {
                *position += 0.016;
            }

            let _collisions = profiler.enter(collisions)?;
            let overlapping = positions
                .windows(2)
                .filter(|pair| (pair[1] - pair[0]).abs() < 0.5)
                .count();
            black_box(overlapping);
        }

        {
            let _render = profiler.enter(render)?;
            let checksum: f64 = positions.iter().map(|p| p.sin()).sum();
            black_box(checksum);
        }
    }

    profiler.ensure_balanced()?;

    let report = profiler.report();
    report.print_to_stdout();

    let path = std::env::temp_dir().join("cycle_tree_basic.txt");
    report.write_to_file(&path)?;
    println!();
    println!("Report written to {}", path.display());

    Ok(())
}
