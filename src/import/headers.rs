use serde_json::{Map, Value};

/// Canonical fields an import row can carry, grouped by the table they land in
pub const PLAN_FIELDS: &[&str] = &["cidpId", "cidpName", "startDate", "endDate"];
pub const PROGRAM_FIELDS: &[&str] = &["programme", "needsPriorities", "strategies", "objectives", "outcomes"];
pub const SUBPROGRAM_FIELDS: &[&str] = &[
    "subProgramme",
    "keyOutcome",
    "kpi",
    "baseline",
    "yr1Targets",
    "yr2Targets",
    "yr3Targets",
    "yr4Targets",
    "yr5Targets",
    "yr1Budget",
    "yr2Budget",
    "yr3Budget",
    "yr4Budget",
    "yr5Budget",
    "totalBudget",
    "remarks",
];

const NUMERIC_FIELDS: &[&str] = &["yr1Budget", "yr2Budget", "yr3Budget", "yr4Budget", "yr5Budget", "totalBudget"];

/// Squashed header text (lowercase, alphanumerics only) to canonical field
const SYNONYMS: &[(&str, &str)] = &[
    ("cidpid", "cidpId"),
    ("cidpcode", "cidpId"),
    ("planid", "cidpId"),
    ("plancode", "cidpId"),
    ("cidpname", "cidpName"),
    ("cidp", "cidpName"),
    ("planname", "cidpName"),
    ("strategicplan", "cidpName"),
    ("strategicplanname", "cidpName"),
    ("startdate", "startDate"),
    ("planstartdate", "startDate"),
    ("cidpstartdate", "startDate"),
    ("enddate", "endDate"),
    ("planenddate", "endDate"),
    ("cidpenddate", "endDate"),
    ("programme", "programme"),
    ("program", "programme"),
    ("programmename", "programme"),
    ("programname", "programme"),
    ("needspriorities", "needsPriorities"),
    ("needsandpriorities", "needsPriorities"),
    ("needs", "needsPriorities"),
    ("priorities", "needsPriorities"),
    ("strategies", "strategies"),
    ("strategy", "strategies"),
    ("objectives", "objectives"),
    ("objective", "objectives"),
    ("programmeobjective", "objectives"),
    ("programobjective", "objectives"),
    ("outcomes", "outcomes"),
    ("outcome", "outcomes"),
    ("subprogramme", "subProgramme"),
    ("subprogram", "subProgramme"),
    ("subprogrammename", "subProgramme"),
    ("subprogramname", "subProgramme"),
    ("keyoutcome", "keyOutcome"),
    ("keyoutcomes", "keyOutcome"),
    ("kpi", "kpi"),
    ("kpis", "kpi"),
    ("keyperformanceindicator", "kpi"),
    ("keyperformanceindicators", "kpi"),
    ("baseline", "baseline"),
    ("baselines", "baseline"),
    ("totalbudget", "totalBudget"),
    ("total", "totalBudget"),
    ("totalbudgetkshs", "totalBudget"),
    ("totalbudgetkes", "totalBudget"),
    ("remarks", "remarks"),
    ("remark", "remarks"),
    ("comments", "remarks"),
];

fn squash(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Map a spreadsheet header to its canonical field, ignoring case, spacing
/// and punctuation. `None` for headers the import does not understand.
pub fn canonical_field(header: &str) -> Option<&'static str> {
    let key = squash(header);
    if key.is_empty() {
        return None;
    }
    if let Some((_, field)) = SYNONYMS.iter().find(|(synonym, _)| *synonym == key) {
        return Some(field);
    }
    yearly_field(&key)
}

/// `Year 1 Target`, `yr3 budget`, `Y5 Targets (KES)` and friends
fn yearly_field(key: &str) -> Option<&'static str> {
    let rest = ["year", "yr", "y"].iter().find_map(|prefix| key.strip_prefix(prefix))?;
    let mut chars = rest.chars();
    let year = chars.next()?.to_digit(10)?;
    let tail = chars.as_str();

    let is_target = tail.starts_with("target");
    let is_budget = tail.starts_with("budget") || tail.starts_with("cost") || tail.starts_with("allocation");
    let field = match (year, is_target, is_budget) {
        (1, true, _) => "yr1Targets",
        (2, true, _) => "yr2Targets",
        (3, true, _) => "yr3Targets",
        (4, true, _) => "yr4Targets",
        (5, true, _) => "yr5Targets",
        (1, _, true) => "yr1Budget",
        (2, _, true) => "yr2Budget",
        (3, _, true) => "yr3Budget",
        (4, _, true) => "yr4Budget",
        (5, _, true) => "yr5Budget",
        _ => return None,
    };
    Some(field)
}

/// Budget cells often arrive as text like `"1,250,000"` or `"KES 40,000.50"`.
fn clean_value(field: &str, value: Value) -> Value {
    match value {
        Value::String(s) if NUMERIC_FIELDS.contains(&field) => {
            let digits: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            match digits.parse::<f64>() {
                Ok(n) => serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::String(s)),
                Err(_) if !digits.chars().any(|c| c.is_ascii_digit()) => Value::Null,
                Err(_) => Value::String(s),
            }
        }
        Value::String(s) if s.trim().is_empty() => Value::Null,
        Value::String(s) => Value::String(s.trim().to_string()),
        other => other,
    }
}

/// Headers resolved against the synonym table
#[derive(Debug, Clone)]
pub struct HeaderMap {
    pub headers: Vec<String>,
    /// Canonical field for each column, by position
    pub fields: Vec<Option<&'static str>>,
}

impl HeaderMap {
    pub fn resolve(headers: Vec<String>) -> Self {
        let mut fields: Vec<Option<&'static str>> = Vec::with_capacity(headers.len());
        for header in &headers {
            // The first column claiming a field wins
            let field = canonical_field(header).filter(|f| !fields.contains(&Some(*f)));
            fields.push(field);
        }
        HeaderMap { headers, fields }
    }

    pub fn unrecognized(&self) -> Vec<String> {
        self.headers
            .iter()
            .zip(&self.fields)
            .filter(|(header, field)| field.is_none() && !header.trim().is_empty())
            .map(|(header, _)| header.clone())
            .collect()
    }

    /// Build a canonical row object; `None` when every mapped cell is empty.
    pub fn map_row(&self, cells: Vec<Value>) -> Option<Map<String, Value>> {
        let mut row = Map::new();
        for (field, value) in self.fields.iter().zip(cells) {
            let Some(field) = field else { continue };
            let value = clean_value(field, value);
            if !value.is_null() {
                row.insert(field.to_string(), value);
            }
        }
        if row.is_empty() { None } else { Some(row) }
    }
}
