//! JSON sidecar files: dataset globals and VCF header dictionaries.

use std::io::BufReader;
use std::path::Path;

use serde_json::Value;
use varqc_model::{Globals, HeaderDict};

use crate::error::{IngestError, Result};
use crate::reader::open_file;

fn read_json(path: &Path) -> Result<Value> {
    let reader = BufReader::new(open_file(path)?);
    serde_json::from_reader(reader).map_err(|source| IngestError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Read dataset globals from a JSON object file.
pub fn read_globals(path: &Path) -> Result<Globals> {
    let value = read_json(path)?;
    Globals::from_value(value).map_err(|e| IngestError::SidecarFormat {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Read a VCF header dictionary.
///
/// The file maps each header section to an object of field -> description.
/// Descriptions may also be given as `{"Description": "..."}` objects, the
/// shape produced by most VCF header exporters.
pub fn read_header_dict(path: &Path) -> Result<HeaderDict> {
    let Value::Object(sections) = read_json(path)? else {
        return Err(IngestError::SidecarFormat {
            path: path.to_path_buf(),
            reason: "expected a JSON object of header sections".to_string(),
        });
    };

    let mut header = HeaderDict::new();
    for (section, fields) in sections {
        let Value::Object(fields) = fields else {
            return Err(IngestError::SidecarFormat {
                path: path.to_path_buf(),
                reason: format!("section '{section}' is not an object"),
            });
        };
        let entries = fields
            .into_iter()
            .map(|(field, description)| (field, description_text(&description)))
            .collect();
        header.insert(section, entries);
    }
    Ok(header)
}

fn description_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("Description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}
