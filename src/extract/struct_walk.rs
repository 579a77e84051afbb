//! Recursive descent looking for allow-listed linear color structs.

use serde_json::Value;

use super::{exports, ParameterSink};
use crate::constants::COLOR_STRUCT_TYPE;
use crate::models::ParamPath;

/// Walks every export, labelling finds with the export's own name.
pub fn extract_exports(doc: &Value, sink: &mut ParameterSink<'_>) {
    let Some(exports) = exports(doc) else {
        return;
    };

    for (index, export) in exports.iter().enumerate() {
        let label = export_label(export, index);
        let path = ParamPath::root().child("Exports").child(index);
        walk(export, &path, &label, sink);
    }
}

/// Walks `node` (found at `path`), recording color structs as
/// `"<label> - <field name>"`.
///
/// A matched node is terminal. Anything else recurses into every object
/// field and array element.
pub fn walk(node: &Value, path: &ParamPath, label: &str, sink: &mut ParameterSink<'_>) {
    match node {
        Value::Object(map) => {
            if let Some((field, color_path, color)) = color_struct(node, path, sink) {
                sink.offer(format!("{label} - {field}"), color_path, color);
                return;
            }
            for (key, child) in map {
                if child.is_object() || child.is_array() {
                    walk(child, &path.child(key.as_str()), label, sink);
                }
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                if child.is_object() || child.is_array() {
                    walk(child, &path.child(index), label, sink);
                }
            }
        }
        _ => {}
    }
}

/// Recognizes `{ Name, StructType: "LinearColor", Value }` where the name is
/// allow-listed and the color carries a numeric `R`.
///
/// The channels live either at `Value[0].Value` or directly at `Value`.
fn color_struct<'v>(
    node: &'v Value,
    path: &ParamPath,
    sink: &ParameterSink<'_>,
) -> Option<(&'v str, ParamPath, &'v Value)> {
    let field = node.get("Name")?.as_str()?;
    if !sink.dictionary().is_color_property(field) {
        return None;
    }
    if node.get("StructType")?.as_str()? != COLOR_STRUCT_TYPE {
        return None;
    }

    let value = node.get("Value")?;
    let (color_path, color) = match value {
        Value::Array(items) => {
            let color = items.first()?.get("Value")?;
            (
                path.child("Value").child(0_usize).child("Value"),
                color,
            )
        }
        Value::Object(_) => (path.child("Value"), value),
        _ => return None,
    };

    has_numeric_red(color).then_some((field, color_path, color))
}

fn has_numeric_red(color: &Value) -> bool {
    match color.get("R") {
        Some(Value::Number(_)) => true,
        Some(Value::String(s)) => s.trim().parse::<f64>().is_ok_and(f64::is_finite),
        _ => false,
    }
}

fn export_label(export: &Value, index: usize) -> String {
    ["ObjectName", "Name"]
        .iter()
        .find_map(|key| export.get(*key).and_then(Value::as_str))
        .filter(|name| !name.is_empty())
        .map_or_else(|| format!("Export {index}"), ToString::to_string)
}
