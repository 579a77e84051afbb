//! Material documents exposing a `VectorParameterValues` table.
//!
//! Layout (UAssetAPI JSON projection):
//!
//! ```text
//! Exports[e].Data[d] = { Name: "VectorParameterValues", Value: [param, ...] }
//! param.Value = [ { Name: "ParameterInfo", Value: [ { Name: "Name", Value: "<name>" }, ... ] },
//!                 { Name: "ParameterValue", Value: [ { Value: { R, G, B, A } } ] }, ... ]
//! ```

use serde_json::Value;

use super::{exports, find_named, ParameterSink};
use crate::constants::VECTOR_PARAMETER_VALUES;
use crate::models::ParamPath;

/// Finds the export and data entry holding the vector parameter table.
pub fn locate(doc: &Value) -> Option<(usize, usize)> {
    exports(doc)?.iter().enumerate().find_map(|(export_index, export)| {
        let data = export.get("Data")?.as_array()?;
        let (entry_index, entry) = find_named(data, VECTOR_PARAMETER_VALUES)?;
        entry.get("Value")?.as_array()?;
        Some((export_index, entry_index))
    })
}

/// Records every named linear color in the table.
pub fn extract(doc: &Value, export: usize, entry: usize, sink: &mut ParameterSink<'_>) {
    let table_path = ParamPath::root()
        .child("Exports")
        .child(export)
        .child("Data")
        .child(entry)
        .child("Value");

    let Some(params) = table_path.resolve(doc).and_then(Value::as_array) else {
        return;
    };

    for (param_index, param) in params.iter().enumerate() {
        let Some(fields) = param.get("Value").and_then(Value::as_array) else {
            continue;
        };
        let Some(name) = parameter_name(fields) else {
            continue;
        };
        let Some((value_index, value_struct)) = find_named(fields, "ParameterValue") else {
            continue;
        };
        let Some(color) = value_struct
            .get("Value")
            .and_then(|v| v.get(0))
            .and_then(|v| v.get("Value"))
            .filter(|v| v.is_object())
        else {
            continue;
        };

        let path = table_path
            .child(param_index)
            .child("Value")
            .child(value_index)
            .child("Value")
            .child(0_usize)
            .child("Value");
        sink.offer(name.to_string(), path, color);
    }
}

fn parameter_name(fields: &[Value]) -> Option<&str> {
    let (_, info) = find_named(fields, "ParameterInfo")?;
    let info_fields = info.get("Value")?.as_array()?;
    let (_, name) = find_named(info_fields, "Name")?;
    name.get("Value")?.as_str().filter(|s| !s.is_empty())
}
