use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::info;

use crate::error::{OroshiError, Result};
use crate::models::{SaleRow, SummaryRow, YearMonth};

#[derive(Default)]
struct Totals {
    dates: BTreeSet<NaiveDate>,
    quantity: f64,
    amount: f64,
}

/// Group rows by (customer code, customer name, year-month) and total each
/// group. Rows missing a code or a year-month belong to no group.
///
/// Output is sorted by the group key. An empty input, or one where no row
/// forms a group, is reported instead of producing an empty table.
pub fn summarize(rows: &[SaleRow]) -> Result<Vec<SummaryRow>> {
    if rows.is_empty() {
        return Err(OroshiError::EmptyFilterResult);
    }

    let mut groups: BTreeMap<(String, String, YearMonth), Totals> = BTreeMap::new();
    for row in rows {
        let (Some(code), Some(ym)) = (&row.customer_code, row.year_month) else {
            continue;
        };
        let totals = groups
            .entry((code.clone(), row.customer_name.clone(), ym))
            .or_default();
        if let Some(date) = row.sale_date {
            totals.dates.insert(date);
        }
        totals.quantity += row.quantity.unwrap_or(0.0);
        totals.amount += row.sale_amount.unwrap_or(0.0);
    }

    if groups.is_empty() {
        return Err(OroshiError::EmptyFilterResult);
    }
    info!(rows = rows.len(), groups = groups.len(), "aggregated");

    Ok(groups
        .into_iter()
        .map(|((customer_code, customer_name, year_month), t)| SummaryRow {
            customer_code,
            customer_name,
            year_month,
            unique_dates: t.dates.len(),
            quantity_total: t.quantity,
            amount_total: t.amount,
        })
        .collect())
}
