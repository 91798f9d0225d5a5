//! PDF exports for strategic plans and programs.

pub mod document;
pub mod layout;

use serde_json::Value;

use layout::{Column, PageWriter, Table};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("PDF generation failed: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("PDF write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A program row and its live subprograms
pub struct ProgramSection {
    pub program: Value,
    pub subprograms: Vec<Value>,
}

fn text(row: &Value, key: &str) -> String {
    match row.get(key) {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// `1250000.5` → `1,250,000.50`
pub fn format_amount(value: Option<&Value>) -> String {
    let amount = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let Some(amount) = amount else { return "-".to_string() };

    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, cents)
}

fn targets(subprogram: &Value) -> String {
    (1..=5)
        .filter_map(|year| {
            let value = text(subprogram, &format!("yr{}Targets", year));
            (value != "-").then(|| format!("Y{}: {}", year, value))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn subprogram_cells(subprogram: &Value) -> Vec<String> {
    vec![
        text(subprogram, "subProgramme"),
        text(subprogram, "keyOutcome"),
        text(subprogram, "kpi"),
        text(subprogram, "baseline"),
        format_amount(subprogram.get("totalBudget")),
    ]
}

/// Plan header followed by one table of every program and its subprograms
pub fn strategic_plan_pdf(plan: &Value, sections: &[ProgramSection]) -> Result<Vec<u8>, ReportError> {
    let title = format!("Strategic Plan: {}", text(plan, "cidpName"));
    let mut writer = PageWriter::new();
    writer.heading(&title, 16.0);
    writer.field("CIDP ID", &text(plan, "cidpId"));
    writer.field("Period", &format!("{} to {}", text(plan, "startDate"), text(plan, "endDate")));
    if plan.get("description").map_or(false, |d| !d.is_null()) {
        writer.field("Description", &text(plan, "description"));
    }
    writer.gap(10.0);

    let mut rows = Vec::new();
    for section in sections {
        let programme = text(&section.program, "programme");
        if section.subprograms.is_empty() {
            rows.push(vec![programme.clone(), "-".into(), "-".into(), "-".into(), "-".into(), "-".into()]);
        }
        for subprogram in &section.subprograms {
            let mut cells = vec![programme.clone()];
            cells.extend(subprogram_cells(subprogram));
            rows.push(cells);
        }
    }

    if rows.is_empty() {
        writer.field("Programmes", "none recorded");
    } else {
        writer.table(&Table {
            columns: vec![
                Column { title: "Programme", weight: 1.4 },
                Column { title: "Sub-Programme", weight: 1.4 },
                Column { title: "Key Outcome", weight: 1.4 },
                Column { title: "KPI", weight: 1.2 },
                Column { title: "Baseline", weight: 0.9 },
                Column { title: "Total Budget", weight: 1.0 },
            ],
            rows,
        });
    }

    document::render(writer.finish(), &title)
}

/// One program's details and a table of its subprograms with yearly targets
pub fn program_pdf(program: &Value, subprograms: &[Value]) -> Result<Vec<u8>, ReportError> {
    let title = format!("Programme: {}", text(program, "programme"));
    let mut writer = PageWriter::new();
    writer.heading(&title, 16.0);
    for (label, key) in [
        ("Needs & Priorities", "needsPriorities"),
        ("Strategies", "strategies"),
        ("Objectives", "objectives"),
        ("Outcomes", "outcomes"),
        ("Remarks", "remarks"),
    ] {
        if program.get(key).map_or(false, |v| !v.is_null()) {
            writer.field(label, &text(program, key));
        }
    }
    writer.gap(10.0);

    if subprograms.is_empty() {
        writer.field("Sub-Programmes", "none recorded");
    } else {
        let rows = subprograms
            .iter()
            .map(|subprogram| {
                let mut cells = subprogram_cells(subprogram);
                cells.insert(4, targets(subprogram));
                cells
            })
            .collect();
        writer.table(&Table {
            columns: vec![
                Column { title: "Sub-Programme", weight: 1.4 },
                Column { title: "Key Outcome", weight: 1.4 },
                Column { title: "KPI", weight: 1.2 },
                Column { title: "Baseline", weight: 0.9 },
                Column { title: "Targets", weight: 1.3 },
                Column { title: "Total Budget", weight: 1.0 },
            ],
            rows,
        });
    }

    document::render(writer.finish(), &title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Document;
    use serde_json::json;

    #[test]
    fn formats_amounts_with_grouping() {
        assert_eq!(format_amount(Some(&json!(1250000.5))), "1,250,000.50");
        assert_eq!(format_amount(Some(&json!(999))), "999.00");
        assert_eq!(format_amount(Some(&json!("-4500"))), "-4,500.00");
        assert_eq!(format_amount(Some(&Value::Null)), "-");
        assert_eq!(format_amount(None), "-");
    }

    #[test]
    fn plan_report_is_a_readable_pdf() {
        let plan = json!({"cidpId": "CIDP-2023", "cidpName": "County Plan 2023-2027", "startDate": "2023-07-01", "endDate": "2027-06-30"});
        let sections = vec![ProgramSection {
            program: json!({"programme": "Water"}),
            subprograms: vec![json!({"subProgramme": "Boreholes", "kpi": "No. of boreholes", "totalBudget": 5000000})],
        }];
        let bytes = strategic_plan_pdf(&plan, &sections).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn large_programs_paginate() {
        let program = json!({"programme": "Roads", "objectives": "Improve access"});
        let subprograms: Vec<Value> = (0..150)
            .map(|i| json!({"subProgramme": format!("Ward road {}", i), "yr1Targets": "10km", "totalBudget": 100000}))
            .collect();
        let bytes = program_pdf(&program, &subprograms).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().len() > 1);
    }

    #[test]
    fn targets_skip_empty_years() {
        let subprogram = json!({"yr1Targets": "5", "yr3Targets": "7", "yr2Targets": null});
        assert_eq!(targets(&subprogram), "Y1: 5\nY3: 7");
    }
}
