//! `folders-patch`: rewrite a DTO-space patch into source space.
//!
//! Usage:
//!   folders-patch [EditDtoType] < patch.json
//!
//! The DTO type defaults to `FolderEditDto`. `FOLDERS_CONFIG` may name a
//! TOML configuration file. Rejected documents print their field failures
//! to stderr.

use folders::catalog::FOLDER_EDIT_DTO;
use folders::cli::translate_patch;
use folders::{engine, telemetry, EngineConfig};
use std::io::{self, Read, Write};
use std::process::exit;

fn main() {
    let config = match std::env::var_os("FOLDERS_CONFIG") {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    };
    let config = config.unwrap_or_else(|e| {
        eprintln!("{e}");
        exit(1);
    });
    telemetry::init(&config.log);

    let dto_type = std::env::args().nth(1).unwrap_or_else(|| FOLDER_EDIT_DTO.to_string());
    let mut input = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut input) {
        eprintln!("{e}");
        exit(1);
    }
    let engine = engine::init(config).unwrap_or_else(|e| {
        eprintln!("{e}");
        exit(1);
    });

    match translate_patch(engine, &dto_type, input.trim()) {
        Ok(document) => {
            if let Err(e) = writeln!(io::stdout(), "{document}") {
                eprintln!("{e}");
                exit(1);
            }
        }
        Err(e) => {
            match e.failures().map(serde_json::to_string_pretty) {
                Some(Ok(failures)) => eprintln!("{failures}"),
                _ => eprintln!("{e}"),
            }
            exit(1);
        }
    }
}
