//! Renders resolved chart data to bytes in each output format. HTML is
//! always produced (handlebars template); XLSX is produced for `table`
//! charts only (`rust_xlsxwriter`, up to three sheets); PNG stays `None`
//! here since no renderer is injected by default — producing it is
//! best-effort and may fail without breaking the rest of the artifact.

use once_cell::sync::Lazy;
use rust_xlsxwriter::Workbook;
use serde_json::Value;

use crate::error::BoxError;
use crate::model::ArtifactType;

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{{title}}</title></head>
<body>
<h1>{{title}}</h1>
<p class="chart-type">{{chart_type}}</p>
<script type="application/json" id="chart-data">{{{data_json}}}</script>
</body>
</html>
"#;

static REGISTRY: Lazy<handlebars::Handlebars<'static>> = Lazy::new(|| {
    let mut reg = handlebars::Handlebars::new();
    reg.register_template_string("artifact", HTML_TEMPLATE).expect("static template is valid");
    reg
});

pub fn render_html(title: &str, chart_type: ArtifactType, data: &Value) -> Result<Vec<u8>, BoxError> {
    let rendered = REGISTRY.render(
        "artifact",
        &serde_json::json!({
            "title": title,
            "chart_type": chart_type.as_str(),
            "data_json": data.to_string(),
        }),
    )?;
    Ok(rendered.into_bytes())
}

pub fn render_json(title: &str, chart_type: ArtifactType, data: &Value) -> Vec<u8> {
    let doc = serde_json::json!({"title": title, "chart_type": chart_type.as_str(), "data": data});
    serde_json::to_vec_pretty(&doc).unwrap_or_default()
}

/// Three sheets when the data supports it: summary (the raw rows), details
/// (one row per cell with its column header, useful for pivoting), and bias
/// (present only when the table includes a `sentiment`/`credibility`-style
/// bias column).
pub fn render_xlsx(data: &Value) -> Result<Vec<u8>, BoxError> {
    let columns: Vec<String> = data
        .get("columns")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default();
    let rows: Vec<Vec<Value>> = data
        .get("rows")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|r| r.as_array().cloned()).collect())
        .unwrap_or_default();

    let mut workbook = Workbook::new();

    let summary = workbook.add_worksheet().set_name("summary")?;
    for (col_idx, header) in columns.iter().enumerate() {
        summary.write_string(0, col_idx as u16, header)?;
    }
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            write_cell(summary, (row_idx + 1) as u32, col_idx as u16, cell)?;
        }
    }

    if !rows.is_empty() && !columns.is_empty() {
        let details = workbook.add_worksheet().set_name("details")?;
        details.write_string(0, 0, "column")?;
        details.write_string(0, 1, "row")?;
        details.write_string(0, 2, "value")?;
        let mut out_row = 1u32;
        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                let header = columns.get(col_idx).map(String::as_str).unwrap_or("");
                details.write_string(out_row, 0, header)?;
                details.write_number(out_row, 1, row_idx as f64)?;
                write_cell(details, out_row, 2, cell)?;
                out_row += 1;
            }
        }
    }

    if let Some(bias_col) = columns.iter().position(|c| c == "bias_severity" || c == "overall_bias") {
        let bias = workbook.add_worksheet().set_name("bias")?;
        bias.write_string(0, 0, "country")?;
        bias.write_string(0, 1, &columns[bias_col])?;
        for (row_idx, row) in rows.iter().enumerate() {
            if let Some(country) = row.first() {
                write_cell(bias, (row_idx + 1) as u32, 0, country)?;
            }
            if let Some(value) = row.get(bias_col) {
                write_cell(bias, (row_idx + 1) as u32, 1, value)?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_cell(sheet: &mut rust_xlsxwriter::Worksheet, row: u32, col: u16, value: &Value) -> Result<(), BoxError> {
    match value {
        Value::Number(n) => {
            sheet.write_number(row, col, n.as_f64().unwrap_or(0.0))?;
        }
        Value::String(s) => {
            sheet.write_string(row, col, s)?;
        }
        Value::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        other => {
            sheet.write_string(row, col, &other.to_string())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_embeds_title_and_data() {
        let data = serde_json::json!({"x": ["a"], "y": [1.0]});
        let bytes = render_html("My Chart", ArtifactType::BarChart, &data).unwrap();
        let html = String::from_utf8(bytes).unwrap();
        assert!(html.contains("My Chart"));
        assert!(html.contains("bar_chart"));
    }

    #[test]
    fn xlsx_round_trips_table_rows() {
        let data = serde_json::json!({
            "columns": ["country", "score"],
            "rows": [["USA", -0.4], ["FRA", 0.2]],
        });
        let bytes = render_xlsx(&data).unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn json_sidecar_contains_title_and_chart_type() {
        let data = serde_json::json!({"x": ["a"]});
        let bytes = render_json("t", ArtifactType::LineChart, &data);
        let parsed: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed["chart_type"], "line_chart");
    }
}
