//! CLI interface for script compilation

use std::path::Path;

use crate::compile::{StoryCatalog, compile_document};
use crate::graph::{Character, read_document};

pub fn execute(
    source: &Path,
    output: Option<&Path>,
    characters: Option<&Path>,
) -> anyhow::Result<()> {
    let doc = read_document(source)?;

    let mut catalog = StoryCatalog::new();
    if let Some(path) = characters {
        let content = std::fs::read_to_string(path)?;
        let records: Vec<Character> = serde_json::from_str(&content)?;
        println!("Loaded {} character records", records.len());
        for character in records {
            catalog.add_character(character);
        }
    }

    let script = compile_document(doc, &catalog);

    match output {
        Some(path) => {
            std::fs::write(path, &script)?;
            println!("Wrote {} bytes to {:?}", script.len(), path);
        }
        None => print!("{script}"),
    }

    Ok(())
}
