use crate::error::KpiError;
use crate::schema::Schema;
use chrono::{Datelike, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

/// A calendar month. Always stored as the first day of that month so
/// ordering and equality ignore the day component of the source value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month(NaiveDate);

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Month> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Month)
    }

    pub fn from_date(date: NaiveDate) -> Month {
        Month(date.with_day(1).unwrap_or(date))
    }

    /// The month `n` months before this one (saturates at the calendar floor).
    pub fn back(self, n: u32) -> Month {
        Month(self.0.checked_sub_months(Months::new(n)).unwrap_or(self.0))
    }
}

impl FromStr for Month {
    type Err = KpiError;

    // Spreadsheet exports give us `2025-01`, `2025-01-01` or a full timestamp.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Month::from_date(d));
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(Month::from_date(dt.date()));
        }
        NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
            .map(Month)
            .map_err(|_| KpiError::InvalidMonth(s.to_string()))
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A single cell: either a dimension label or a numeric measure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Field {
    Text(String),
    Number(f64),
}

impl Field {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Field::Text(s) => Some(s),
            Field::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Field::Number(n) => Some(*n),
            Field::Text(_) => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Text(s) => f.write_str(s),
            Field::Number(n) => write!(f, "{}", n),
        }
    }
}

/// One row of a KPI dataset. A missing measure is represented by the column
/// being absent, never by a sentinel value.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub month: Month,
    fields: HashMap<String, Field>,
}

impl MetricRecord {
    pub fn new(month: Month) -> Self {
        MetricRecord {
            month,
            fields: HashMap::new(),
        }
    }

    pub fn with_text(mut self, column: &str, value: impl Into<String>) -> Self {
        self.set(column, Field::Text(value.into()));
        self
    }

    pub fn with_number(mut self, column: &str, value: f64) -> Self {
        self.set(column, Field::Number(value));
        self
    }

    pub fn set(&mut self, column: &str, value: Field) {
        self.fields.insert(column.to_string(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Field> {
        self.fields.get(column)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Field::as_text)
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Field::as_number)
    }
}

/// Rows of one logical dataset sharing a schema. Row order is kept as
/// inserted; it only matters for sampling (`head`).
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTable {
    schema: Schema,
    rows: Vec<MetricRecord>,
}

impl MetricTable {
    pub fn new(schema: Schema) -> Self {
        MetricTable {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(schema: Schema, rows: Vec<MetricRecord>) -> Self {
        MetricTable { schema, rows }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[MetricRecord] {
        &self.rows
    }

    pub fn push(&mut self, row: MetricRecord) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn head(&self, n: usize) -> &[MetricRecord] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Distinct months, ascending.
    pub fn months(&self) -> Vec<Month> {
        let set: BTreeSet<Month> = self.rows.iter().map(|r| r.month).collect();
        set.into_iter().collect()
    }

    /// Distinct non-empty labels of a text column, sorted.
    pub fn distinct_text(&self, column: &str) -> Vec<String> {
        let set: BTreeSet<&str> = self.rows.iter().filter_map(|r| r.text(column)).collect();
        set.into_iter().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_parses_common_spreadsheet_shapes() {
        let expected = Month::new(2025, 3).unwrap();
        assert_eq!("2025-03".parse::<Month>().unwrap(), expected);
        assert_eq!("2025-03-17".parse::<Month>().unwrap(), expected);
        assert_eq!("2025-03-01 00:00:00".parse::<Month>().unwrap(), expected);
        assert_eq!(expected.to_string(), "2025-03");
    }

    #[test]
    fn month_rejects_garbage() {
        assert!(matches!(
            "March".parse::<Month>(),
            Err(KpiError::InvalidMonth(_))
        ));
    }

    #[test]
    fn month_back_crosses_year_boundary() {
        let jan = Month::new(2025, 1).unwrap();
        assert_eq!(jan.back(2), Month::new(2024, 11).unwrap());
    }

    #[test]
    fn head_clamps_to_length() {
        let schema = Schema::new("T", &[], &["V"]);
        let jan = Month::new(2025, 1).unwrap();
        let table = MetricTable::from_rows(
            schema,
            vec![MetricRecord::new(jan).with_number("V", 1.0)],
        );
        assert_eq!(table.head(100).len(), 1);
        assert_eq!(table.head(0).len(), 0);
    }
}
