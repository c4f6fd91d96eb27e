use fibra_core::error::FibraError;
use fibra_core::parsing::lookup::fuzzy_lookup;
use fibra_core::Backends;
use std::path::Path;

use crate::output;

pub fn run(input_file: &Path, query: &str, threshold: u8, output_format: &str) -> Result<(), FibraError> {
    let bytes = std::fs::read(input_file)?;
    let pages = fibra_core::extract_pages(input_file, &bytes, &Backends::default())?;
    let hit = fuzzy_lookup(&pages, query, threshold);

    match output_format {
        "json" => println!("{}", serde_json::to_string_pretty(&hit)?),
        _ => match hit {
            Some(ref hit) => output::table::print_lookup(hit),
            None => println!("No cell matches \"{query}\" with at least {threshold}% similarity"),
        },
    }
    Ok(())
}
