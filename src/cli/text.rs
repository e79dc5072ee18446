use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::fmt::{plain_number, yen};
use crate::models::{SaleRow, SummaryRow};
use crate::normalizer::NormalizeReport;

pub fn format_load_report(report: &NormalizeReport) -> String {
    format!(
        "{} rows loaded: {} zero amount, {} cash sales, {} other sale types dropped; {} kept",
        report.loaded,
        report.zero_amount,
        report.cash_sale,
        report.other_sale_type,
        report.retained.to_string().bold()
    )
}

pub fn format_preview(rows: &[SaleRow], limit: usize) -> String {
    let mut table = Table::new();
    table.set_header(vec!["売上日付", "得意先名", "商品名", "売上金額"]);
    for row in rows.iter().take(limit) {
        table.add_row(vec![
            Cell::new(row.sale_date.map(|d| d.to_string()).unwrap_or_default()),
            Cell::new(&row.customer_name),
            Cell::new(row.product_name.to_text()),
            Cell::new(row.sale_amount.map(yen).unwrap_or_default())
                .set_alignment(CellAlignment::Right),
        ]);
    }
    let mut out = table.to_string();
    if rows.len() > limit {
        out.push_str(&format!("\n… {} more rows", rows.len() - limit));
    }
    out
}

pub fn format_customers(names: &[String]) -> String {
    let mut out = format!("{}\n", format!("{} customers", names.len()).bold());
    for name in names {
        out.push_str(&format!("  {name}\n"));
    }
    out
}

pub fn format_summary(rows: &[SummaryRow]) -> String {
    let mut table = Table::new();
    table.set_header(crate::columns::SUMMARY_HEADER.to_vec());
    for row in rows {
        table.add_row(vec![
            Cell::new(&row.customer_code),
            Cell::new(&row.customer_name),
            Cell::new(row.year_month.to_string()),
            Cell::new(row.unique_dates).set_alignment(CellAlignment::Right),
            Cell::new(plain_number(row.quantity_total)).set_alignment(CellAlignment::Right),
            Cell::new(yen(row.amount_total)).set_alignment(CellAlignment::Right),
        ]);
    }
    let quantity: f64 = rows.iter().map(|r| r.quantity_total).sum();
    let amount: f64 = rows.iter().map(|r| r.amount_total).sum();
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(plain_number(quantity)).set_alignment(CellAlignment::Right),
        Cell::new(yen(amount)).set_alignment(CellAlignment::Right),
    ]);
    table.to_string()
}
