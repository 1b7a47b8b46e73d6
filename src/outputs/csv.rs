//! Merge every per-restaurant JSON file into one CSV.
//!
//! Older output files were written by different tools, so each column is
//! read from its preferred field first and then from known alternatives
//! (`menu_name` for `menu_type`, `item_name` / `title` for `name`, ...).

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument, warn};

pub const COLUMNS: [&str; 8] = [
    "sr_no",
    "restaurant_name",
    "restaurant_url",
    "menu_type",
    "section",
    "name",
    "description",
    "price",
];

/// Coverage counts logged after a combine.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CombineStats {
    pub files: usize,
    pub records: usize,
    pub with_menu_type: usize,
    pub with_section: usize,
    pub with_both: usize,
    pub with_price: usize,
    pub empty_description: usize,
    pub empty_name: usize,
    pub by_restaurant: BTreeMap<String, usize>,
}

impl CombineStats {
    fn percent(&self, n: usize) -> f64 {
        if self.records == 0 {
            0.0
        } else {
            n as f64 * 100.0 / self.records as f64
        }
    }
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write one CSV row, quoting fields that need it.
pub fn write_row<W: Write>(mut w: W, row: &[String]) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(w, ",")?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// First non-empty value among `name` and its `alternatives`.
pub fn field(item: &Map<String, Value>, name: &str, alternatives: &[&str]) -> String {
    std::iter::once(name)
        .chain(alternatives.iter().copied())
        .filter_map(|key| item.get(key))
        .map(cell)
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// One CSV row (in [`COLUMNS`] order) for a JSON record.
pub fn row_from_item(sr_no: usize, item: &Map<String, Value>) -> Vec<String> {
    vec![
        sr_no.to_string(),
        field(item, "restaurant_name", &["restaurant"]),
        field(item, "restaurant_url", &["url", "website"]),
        field(item, "menu_type", &["menu_name"]),
        field(item, "section", &[]),
        field(item, "name", &["item_name", "item", "title"]),
        field(item, "description", &["desc", "details"]),
        field(item, "price", &["pricing", "cost"]),
    ]
}

async fn json_files(output_dir: &Path) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut files = Vec::new();
    let mut entries = fs::read_dir(output_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|e| e == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Combine `output_dir/*.json` into `csv_path`, numbering rows from 1.
/// Files that are not JSON arrays are skipped with a warning.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display(), csv = %csv_path.display()))]
pub async fn combine_outputs(
    output_dir: &Path,
    csv_path: &Path,
) -> Result<CombineStats, Box<dyn Error>> {
    let files = json_files(output_dir).await?;
    if files.is_empty() {
        warn!("No JSON files to combine");
    }

    let mut out: Vec<u8> = Vec::new();
    write_row(&mut out, &COLUMNS.map(String::from))?;

    let mut stats = CombineStats::default();
    for path in &files {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let raw = match fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) => {
                error!(file = %file_name, error = %e, "Could not read file");
                continue;
            }
        };
        let records = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(records)) => records,
            Ok(_) => {
                warn!(file = %file_name, "Not a JSON array; skipping");
                continue;
            }
            Err(e) => {
                error!(file = %file_name, error = %e, "Invalid JSON; skipping");
                continue;
            }
        };

        stats.files += 1;
        let mut count = 0usize;
        let mut restaurant: Option<String> = None;
        for item in records.iter().filter_map(Value::as_object) {
            let row = row_from_item(stats.records + 1, item);
            let [_, name, _, menu_type, section, item_name, description, price] = &row[..] else {
                continue;
            };
            stats.with_menu_type += usize::from(!menu_type.is_empty());
            stats.with_section += usize::from(!section.is_empty());
            stats.with_both += usize::from(!menu_type.is_empty() && !section.is_empty());
            stats.with_price += usize::from(!price.is_empty());
            stats.empty_description += usize::from(description.is_empty());
            stats.empty_name += usize::from(item_name.is_empty());
            if restaurant.is_none() && !name.is_empty() {
                restaurant = Some(name.clone());
            }

            write_row(&mut out, &row)?;
            stats.records += 1;
            count += 1;
        }

        let key = restaurant.unwrap_or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default()
        });
        *stats.by_restaurant.entry(key).or_default() += count;
        info!(file = %file_name, records = count, "Combined file");
    }

    fs::write(csv_path, out).await?;

    info!(
        files = stats.files,
        records = stats.records,
        restaurants = stats.by_restaurant.len(),
        "Wrote combined CSV"
    );
    info!(
        menu_type_pct = format!("{:.1}", stats.percent(stats.with_menu_type)),
        section_pct = format!("{:.1}", stats.percent(stats.with_section)),
        both_pct = format!("{:.1}", stats.percent(stats.with_both)),
        price_pct = format!("{:.1}", stats.percent(stats.with_price)),
        no_description = stats.empty_description,
        no_name = stats.empty_name,
        "Coverage"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_write_row_quotes() {
        let mut out = Vec::new();
        write_row(
            &mut out,
            &["1".into(), "Cup $4.50, Bowl $6".into(), "12\" sub".into()],
        )
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "1,\"Cup $4.50, Bowl $6\",\"12\"\" sub\"\n"
        );
    }

    #[test]
    fn test_field_alternatives() {
        let item = object(json!({
            "item_name": "Reuben",
            "menu_name": "Lunch",
            "menu_type": "",
            "price": 12,
            "desc": null
        }));
        let row = row_from_item(7, &item);
        assert_eq!(row[0], "7");
        assert_eq!(row[3], "Lunch");
        assert_eq!(row[5], "Reuben");
        assert_eq!(row[6], "");
        assert_eq!(row[7], "12");
    }

    #[tokio::test]
    async fn test_combine_outputs() {
        let dir = std::env::temp_dir().join(format!("menu_scrape_combine_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("a_com.json"),
            json!([
                {"name": "Wings", "price": "$14", "menu_type": "STARTERS", "restaurant_name": "A Pub", "description": ""},
                {"name": "Pie", "price": "", "menu_type": "Main Menu", "section": "Desserts", "restaurant_name": "A Pub"}
            ])
            .to_string(),
        )
        .unwrap();
        std::fs::write(dir.join("b_com.json"), r#"{"not": "a list"}"#).unwrap();
        std::fs::write(dir.join("c_com.json"), "[]").unwrap();

        let csv_path = dir.join("all.csv");
        let stats = combine_outputs(&dir, &csv_path).await.unwrap();
        assert_eq!(stats.files, 2);
        assert_eq!(stats.records, 2);
        assert_eq!(stats.with_price, 1);
        assert_eq!(stats.with_both, 1);
        assert_eq!(stats.by_restaurant.get("A Pub"), Some(&2));
        assert_eq!(stats.by_restaurant.get("c_com"), Some(&0));

        let csv = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], COLUMNS.join(","));
        assert_eq!(lines[1], "1,A Pub,,STARTERS,,Wings,,$14");
        assert_eq!(lines[2], "2,A Pub,,Main Menu,Desserts,Pie,,");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
