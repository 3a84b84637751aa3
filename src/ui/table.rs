use crate::Row;
use serde_json::Value;
use tabled::{Table, Tabled, builder::Builder, settings::Style};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Table")]
    pub table: String,
    #[tabled(rename = "Rows")]
    pub rows: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            table: label.to_string(),
            rows: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn stats_table(stats: &[(&str, &str)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

/// Render query result rows as a grid, columns taken from the first
/// row (all rows of one statement share a column set).
pub fn results_table(rows: &[Row]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };
    let columns: Vec<&String> = first.keys().collect();

    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| c.to_string()));
    for row in rows {
        builder.push_record(columns.iter().map(|column| {
            match row.get(*column) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            }
        }));
    }

    builder.build().with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_results_table_renders_columns_and_nulls() {
        let rows = vec![
            row(json!({ "id": 1, "name": "AgroBank", "region": null })),
            row(json!({ "id": 2, "name": "Harvest Logistics", "region": "North India" })),
        ];
        let rendered = results_table(&rows);
        assert!(rendered.contains("AgroBank"));
        assert!(rendered.contains("North India"));
        assert!(rendered.contains("name"));
    }

    #[test]
    fn test_empty_results_render_nothing() {
        assert!(results_table(&[]).is_empty());
    }

    #[test]
    fn test_stats_table() {
        let rendered = stats_table(&[("users", "4"), ("sectors", "3")]);
        assert!(rendered.contains("users"));
        assert!(rendered.contains("3"));
    }
}
