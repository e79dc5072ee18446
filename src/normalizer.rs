use tracing::{debug, info};

use crate::columns;
use crate::error::{OroshiError, Result};
use crate::kana::{has_halfwidth_katakana, to_fullwidth_katakana};
use crate::loader::cell_to_date;
use crate::models::{Cell, ColumnKind, RawTable, SaleRow, YearMonth};

/// Legal-entity markers removed from customer names, applied in this order.
pub const CORPORATE_MARKERS: &[&str] = &["（株）", "（有）", "㈱", "(有)", "(株)", "(株）", "（株)"];

/// Customer names starting with this are cash-sale placeholders, not customers.
pub const CASH_SALE_PREFIX: &str = "現金売上";

/// Sale types kept for aggregation: sales and returns.
pub const PERMITTED_SALE_TYPES: &[&str] = &["売上", "返品"];

#[derive(Debug, Default, Clone, PartialEq)]
pub struct NormalizeReport {
    pub loaded: usize,
    pub unparsed_dates: usize,
    pub widened_cells: usize,
    pub zero_amount: usize,
    pub cash_sale: usize,
    pub other_sale_type: usize,
    pub retained: usize,
}

pub fn strip_corporate_markers(name: &str) -> String {
    CORPORATE_MARKERS
        .iter()
        .fold(name.to_string(), |acc, marker| acc.replace(marker, ""))
}

/// Join both name fragments, drop entity markers and leading whitespace.
/// A missing fragment contributes nothing.
pub fn customer_name(part1: &Cell, part2: &Cell) -> String {
    let joined = format!("{}{}", part1.to_text(), part2.to_text());
    strip_corporate_markers(&joined).trim_start().to_string()
}

fn require(table: &RawTable, name: &str) -> Result<usize> {
    table.column_index(name).ok_or_else(|| OroshiError::Schema {
        missing: vec![name.to_string()],
    })
}

struct Widener {
    kinds: Vec<ColumnKind>,
    widened: usize,
}

impl Widener {
    fn text(&mut self, s: &str) -> String {
        if has_halfwidth_katakana(s) {
            self.widened += 1;
            to_fullwidth_katakana(s)
        } else {
            s.to_string()
        }
    }

    /// Widen a cell from column `col`; only text cells of text columns change.
    fn cell(&mut self, col: usize, cell: &Cell) -> Cell {
        match cell {
            Cell::Text(s) if self.kinds[col] == ColumnKind::Text => Cell::Text(self.text(s)),
            other => other.clone(),
        }
    }
}

/// Turn the raw table into retained sale rows.
///
/// Name cleanup, date coercion and width conversion happen for every row
/// first; the zero-amount, cash-sale and sale-type exclusions run afterwards
/// on the normalized values.
pub fn normalize(table: &RawTable) -> Result<(Vec<SaleRow>, NormalizeReport)> {
    let name1 = require(table, columns::NAME_PART1)?;
    let name2 = require(table, columns::NAME_PART2)?;
    let date = require(table, columns::SALE_DATE)?;
    let product = require(table, columns::PRODUCT_NAME)?;
    let quantity = require(table, columns::QUANTITY)?;
    let amount = require(table, columns::SALE_AMOUNT)?;
    let code = require(table, columns::CUSTOMER_CODE)?;
    let sale_type = require(table, columns::SALE_TYPE)?;

    let mut report = NormalizeReport {
        loaded: table.rows.len(),
        ..Default::default()
    };
    let mut widener = Widener {
        kinds: table.column_kinds(),
        widened: 0,
    };

    let mut rows = Vec::with_capacity(table.rows.len());
    for i in 0..table.rows.len() {
        let name = customer_name(table.cell(i, name1), table.cell(i, name2));
        let sale_date = cell_to_date(table.cell(i, date));
        if sale_date.is_none() {
            report.unparsed_dates += 1;
        }
        let code_cell = widener.cell(code, table.cell(i, code));
        rows.push(SaleRow {
            customer_code: (!code_cell.is_empty()).then(|| code_cell.to_text()),
            customer_name: widener.text(&name),
            sale_date,
            year_month: sale_date.map(YearMonth::of),
            product_name: widener.cell(product, table.cell(i, product)),
            quantity: table.cell(i, quantity).as_number(),
            sale_amount: table.cell(i, amount).as_number(),
            sale_type: widener.cell(sale_type, table.cell(i, sale_type)),
        });
    }
    report.widened_cells = widener.widened;

    rows.retain(|r| {
        let keep = r.sale_amount != Some(0.0);
        if !keep {
            report.zero_amount += 1;
        }
        keep
    });
    rows.retain(|r| {
        let keep = !r.customer_name.starts_with(CASH_SALE_PREFIX);
        if !keep {
            report.cash_sale += 1;
        }
        keep
    });
    rows.retain(|r| {
        let keep = r
            .sale_type
            .as_text()
            .is_some_and(|t| PERMITTED_SALE_TYPES.contains(&t));
        if !keep {
            report.other_sale_type += 1;
        }
        keep
    });
    report.retained = rows.len();

    debug!(
        unparsed_dates = report.unparsed_dates,
        widened_cells = report.widened_cells,
        "normalized columns"
    );
    info!(
        loaded = report.loaded,
        zero_amount = report.zero_amount,
        cash_sale = report.cash_sale,
        other_sale_type = report.other_sale_type,
        retained = report.retained,
        "dropped invalid rows"
    );
    Ok((rows, report))
}
