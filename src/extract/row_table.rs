//! Data table exports whose rows are style structs.

use serde_json::Value;

use super::{exports, struct_walk, ParameterSink};
use crate::constants::{DATA_TABLE_EXPORT_TYPE, STYLE_ROW_TYPES};
use crate::models::ParamPath;

fn table_rows(doc: &Value) -> Option<&Vec<Value>> {
    let export = exports(doc)?.first()?;
    if export.get("$type")?.as_str()? != DATA_TABLE_EXPORT_TYPE {
        return None;
    }
    export.get("Table")?.get("Data")?.as_array()
}

/// True when the first export is a data table with a row array.
pub fn is_row_table(doc: &Value) -> bool {
    table_rows(doc).is_some()
}

/// Walks each style row, labelling finds with the row's name.
pub fn extract(doc: &Value, sink: &mut ParameterSink<'_>) {
    let Some(rows) = table_rows(doc) else {
        return;
    };

    let rows_path = ParamPath::root()
        .child("Exports")
        .child(0_usize)
        .child("Table")
        .child("Data");

    for (index, row) in rows.iter().enumerate() {
        let is_style_row = row
            .get("StructType")
            .and_then(Value::as_str)
            .is_some_and(|tag| STYLE_ROW_TYPES.contains(&tag));
        if !is_style_row {
            continue;
        }
        let Some(value) = row.get("Value") else {
            continue;
        };
        let label = row.get("Name").and_then(Value::as_str).unwrap_or_default();
        struct_walk::walk(value, &rows_path.child(index).child("Value"), label, sink);
    }
}

#[cfg(test)]
mod tests {
    use super::super::{extract_parameters, DocumentShape};
    use super::*;
    use crate::models::FilterDictionary;
    use serde_json::json;

    fn style_row(name: &str, struct_type: &str, r: f64) -> Value {
        json!({
            "Name": name,
            "StructType": struct_type,
            "Value": [
                {"Name": "Font", "Value": "Roboto"},
                {
                    "Name": "Color",
                    "StructType": "LinearColor",
                    "Value": [{"Name": "Color", "Value": {"R": r, "G": 0.5, "B": 0.5, "A": 1.0}}]
                }
            ]
        })
    }

    fn table(rows: Vec<Value>) -> Value {
        json!({"Exports": [{
            "$type": "UAssetAPI.ExportTypes.DataTableExport, UAssetAPI",
            "ObjectName": "DT_RichText",
            "Table": {"Data": rows}
        }]})
    }

    #[test]
    fn test_style_rows_labelled_by_row_name() {
        let doc = table(vec![
            style_row("Warning", "RichTextStyleRow", 1.0),
            style_row("Skipped", "SomeOtherRow", 0.1),
            style_row("Hint", "RichTextStyleRow", 0.2),
        ]);
        let mut out = Vec::new();
        let shape = extract_parameters(&doc, "dt.json", &FilterDictionary::default(), &mut out);

        assert_eq!(shape, DocumentShape::RowTable);
        let names: Vec<_> = out.iter().map(|p| p.param_name.as_str()).collect();
        assert_eq!(names, vec!["Warning - Color", "Hint - Color"]);
        assert_eq!(
            out[1].path.to_string(),
            "$.Exports[0].Table.Data[2].Value[1].Value[0].Value"
        );
        assert!(out[1].path.resolve(&doc).is_some());
    }

    #[test]
    fn test_not_a_table_without_type_marker() {
        let doc = json!({"Exports": [{"Table": {"Data": []}}]});
        assert!(!is_row_table(&doc));
        let doc = json!({"Exports": [{
            "$type": "UAssetAPI.ExportTypes.DataTableExport, UAssetAPI",
            "Table": {"Data": {}}
        }]});
        assert!(!is_row_table(&doc));
    }
}
