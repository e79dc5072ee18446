use std::fmt;

use chrono::{Datelike, NaiveDate};

/// A single spreadsheet cell as loaded, before any column is interpreted.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date-time (days since 1899-12-30).
    DateTime(f64),
}

impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Render the cell as display text. Empty cells render as "".
    pub fn to_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.clone(),
            Self::Number(n) | Self::DateTime(n) => crate::fmt::plain_number(*n),
            Self::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        }
    }

    /// Numeric value of the cell; text is parsed leniently, anything else is None.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => crate::loader::parse_number(s),
            _ => None,
        }
    }
}

/// Semantic type of a loaded column, decided once at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Numeric,
    Temporal,
}

/// Rows x named columns exactly as read from the source file.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at (row, column); short rows read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&Cell::Empty)
    }

    pub fn column_kind(&self, col: usize) -> ColumnKind {
        let mut any_value = false;
        let mut all_dates = true;
        for row in 0..self.rows.len() {
            match self.cell(row, col) {
                Cell::Text(_) => return ColumnKind::Text,
                Cell::Empty => {}
                Cell::DateTime(_) => any_value = true,
                _ => {
                    any_value = true;
                    all_dates = false;
                }
            }
        }
        if any_value && all_dates {
            ColumnKind::Temporal
        } else {
            ColumnKind::Numeric
        }
    }

    pub fn column_kinds(&self) -> Vec<ColumnKind> {
        (0..self.columns.len()).map(|c| self.column_kind(c)).collect()
    }
}

/// Calendar month used as an aggregation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parse "YYYY-MM".
    pub fn parse(s: &str) -> Option<Self> {
        let (y, m) = s.trim().split_once('-')?;
        let year = y.parse().ok()?;
        let month: u32 = m.parse().ok()?;
        (1..=12).contains(&month).then_some(Self { year, month })
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// One transaction after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRow {
    pub customer_code: Option<String>,
    pub customer_name: String,
    pub sale_date: Option<NaiveDate>,
    pub year_month: Option<YearMonth>,
    pub product_name: Cell,
    pub quantity: Option<f64>,
    pub sale_amount: Option<f64>,
    pub sale_type: Cell,
}

/// One output row of the monthly per-customer summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub customer_code: String,
    pub customer_name: String,
    pub year_month: YearMonth,
    pub unique_dates: usize,
    pub quantity_total: f64,
    pub amount_total: f64,
}
