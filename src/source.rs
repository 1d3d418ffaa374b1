//! Mapping directories
//!
//! Type declarations are read from `.json` and `.toml` files, each holding a
//! table `type key -> declaration`. Directories are walked recursively in
//! file name order; other files are ignored.

use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{ConfigError, Result, SchemaError};

/// Read every mapping file under `dirs` into one table
pub fn load_mappings<P: AsRef<Path>>(dirs: &[P]) -> Result<Map<String, Value>> {
    let mut types = Map::new();
    for dir in dirs {
        for entry in WalkDir::new(dir.as_ref()).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            let path = entry.path();
            if !entry.file_type().is_file() || !is_mapping(path) {
                continue;
            }

            let declarations = load_file(path)?;
            debug!(path = %path.display(), types = declarations.len(), "loaded mapping file");
            for (key, declaration) in declarations {
                if types.contains_key(&key) {
                    return Err(SchemaError::Mapping {
                        path: path.to_path_buf(),
                        source: ConfigError::DuplicateType(key),
                    });
                }
                types.insert(key, declaration);
            }
        }
    }
    Ok(types)
}

/// Read one mapping file
pub fn load_file(path: &Path) -> Result<Map<String, Value>> {
    let content = fs::read_to_string(path)?;
    let value: Value = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&content)?,
        _ => serde_json::from_str(&content)?,
    };
    match value {
        Value::Object(types) => Ok(types),
        other => Err(SchemaError::Mapping {
            path: path.to_path_buf(),
            source: crate::raw::not_a_table("<root>", &other),
        }),
    }
}

fn is_mapping(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == "json" || ext == "toml")
        .unwrap_or(false)
}
