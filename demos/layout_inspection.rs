//! Which layout each shape of data gets, and how its size compares to JSON.
//!
//! Run with: cargo run --example layout_inspection

use serde::Serialize;
use serde_lnt::{root_header, to_vec};
use std::error::Error;

#[derive(Serialize)]
struct Reading {
    sensor: u16,
    celsius: f32,
    ok: bool,
}

#[derive(Serialize)]
struct Tagged {
    label: String,
    weight: u32,
}

fn report<T: Serialize>(title: &str, value: &T) -> Result<(), Box<dyn Error>> {
    let bytes = to_vec(value)?;
    let json = serde_json::to_vec(value)?;
    let header = root_header(&bytes)?;
    println!(
        "{:<24} {:<18} {:>6} bytes (JSON {:>6})",
        title,
        header.tag().to_string(),
        bytes.len(),
        json.len()
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let readings: Vec<Reading> = (0..100)
        .map(|i| Reading {
            sensor: i,
            celsius: 20.0 + f32::from(i) / 10.0,
            ok: i % 7 != 0,
        })
        .collect();

    let tagged = vec![
        Tagged {
            label: "a".to_string(),
            weight: 1,
        },
        Tagged {
            label: "b".to_string(),
            weight: 2,
        },
    ];

    report("identical integers", &vec![0u64; 64])?;
    report("same width, mixed sign", &(1u8, -1i8, 2u8))?;
    report("optional values", &vec![Some(1u32), None, Some(3)])?;
    report("sensor readings", &readings)?;
    report("one reading", &readings[0])?;
    report("tagged records", &tagged)?;

    Ok(())
}
