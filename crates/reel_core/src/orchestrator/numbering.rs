//! Numbered output file names (`NNN--<product>.mp4`).

use std::fs;
use std::io;
use std::num::ParseIntError;
use std::path::Path;

/// Next free output number in `output_dir`: one more than the largest
/// numeric prefix (the part before `--`), or 1 when there is none.
///
/// A missing folder counts as empty.
pub fn next_output_number(output_dir: &Path) -> io::Result<u64> {
    let entries = match fs::read_dir(output_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(1),
        Err(e) => return Err(e),
    };

    let mut max = 0u64;
    for entry in entries {
        let name = entry?.file_name();
        let name = name.to_string_lossy();
        match numeric_prefix(&name) {
            Some(Ok(number)) => max = max.max(number),
            Some(Err(_)) => {
                tracing::warn!("Ignoring {}: number prefix out of range", name);
            }
            None => {}
        }
    }
    Ok(max.saturating_add(1))
}

/// File name for output `number` of `product_name`.
pub fn output_file_name(number: u64, product_name: &str) -> String {
    format!("{:03}--{}.mp4", number, product_name)
}

/// Leading digits of the segment before the first `--`, if any.
fn numeric_prefix(name: &str) -> Option<Result<u64, ParseIntError>> {
    let head = name.split("--").next().unwrap_or(name).trim_start();
    let digits: String = head.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    Some(digits.parse())
}
