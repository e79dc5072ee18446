use std::collections::BTreeMap;

use regex::Regex;
use tracing::info;

use crate::error::{OroshiError, Result};
use crate::models::SaleRow;

const SWITCH_PREFIXES: &[&str] = &["Nintendo Switch", "NS"];
const TOMICA_PREFIX: &str = "トミカ";
// Internal product code prefix, not the brand name.
const POKEMON_CARD_PREFIX: &str = "PMカード";
const GUNDAM_PATTERN: &str = "ガンダム";

// ---------------------------------------------------------------------------
// Category filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Switch,
    NotSwitch,
    Tomica,
    PokemonCard,
    Gundam,
}

pub const ALL_CATEGORIES: &[Category] = &[
    Category::Switch,
    Category::NotSwitch,
    Category::Tomica,
    Category::PokemonCard,
    Category::Gundam,
];

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Switch => "Nintendo Switch",
            Self::NotSwitch => "Nintendo Switch以外",
            Self::Tomica => "トミカ",
            Self::PokemonCard => "ポケモンカード",
            Self::Gundam => "ガンダム",
        }
    }
}

/// Checkbox state plus keyword. Every enabled condition narrows the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    pub switch: bool,
    pub not_switch: bool,
    pub tomica: bool,
    pub pokemon_card: bool,
    pub gundam: bool,
    pub keyword: String,
}

impl FilterOptions {
    pub fn is_enabled(&self, category: Category) -> bool {
        match category {
            Category::Switch => self.switch,
            Category::NotSwitch => self.not_switch,
            Category::Tomica => self.tomica,
            Category::PokemonCard => self.pokemon_card,
            Category::Gundam => self.gundam,
        }
    }

    pub fn toggle(&mut self, category: Category) {
        let flag = match category {
            Category::Switch => &mut self.switch,
            Category::NotSwitch => &mut self.not_switch,
            Category::Tomica => &mut self.tomica,
            Category::PokemonCard => &mut self.pokemon_card,
            Category::Gundam => &mut self.gundam,
        };
        *flag = !*flag;
    }
}

enum Predicate {
    StartsWithAny(&'static [&'static str]),
    StartsWithNone(&'static [&'static str]),
    Pattern(Regex),
}

impl Predicate {
    /// Missing or non-text product names never match; the negated switch
    /// predicate keeps them, mirroring a negated non-match.
    fn matches(&self, product: Option<&str>) -> bool {
        match self {
            Self::StartsWithAny(prefixes) => {
                product.is_some_and(|p| prefixes.iter().any(|x| p.starts_with(x)))
            }
            Self::StartsWithNone(prefixes) => {
                !product.is_some_and(|p| prefixes.iter().any(|x| p.starts_with(x)))
            }
            Self::Pattern(re) => product.is_some_and(|p| re.is_match(p)),
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| OroshiError::Pattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

fn build_predicates(options: &FilterOptions) -> Result<Vec<Predicate>> {
    let mut preds = Vec::new();
    if options.switch {
        preds.push(Predicate::StartsWithAny(SWITCH_PREFIXES));
    }
    if options.not_switch {
        preds.push(Predicate::StartsWithNone(SWITCH_PREFIXES));
    }
    if options.tomica {
        preds.push(Predicate::StartsWithAny(&[TOMICA_PREFIX]));
    }
    if options.pokemon_card {
        preds.push(Predicate::StartsWithAny(&[POKEMON_CARD_PREFIX]));
    }
    if options.gundam {
        preds.push(Predicate::Pattern(compile(GUNDAM_PATTERN)?));
    }
    if !options.keyword.is_empty() {
        preds.push(Predicate::Pattern(compile(&options.keyword)?));
    }
    Ok(preds)
}

/// Rows passing every enabled condition. An invalid keyword pattern is
/// reported before any row is examined.
pub fn apply_filter(rows: &[SaleRow], options: &FilterOptions) -> Result<Vec<SaleRow>> {
    let preds = build_predicates(options)?;
    let filtered: Vec<SaleRow> = rows
        .iter()
        .filter(|r| {
            let product = r.product_name.as_text();
            preds.iter().all(|p| p.matches(product))
        })
        .cloned()
        .collect();
    info!(
        input = rows.len(),
        output = filtered.len(),
        conditions = preds.len(),
        "applied filter"
    );
    Ok(filtered)
}

// ---------------------------------------------------------------------------
// Customer selection
// ---------------------------------------------------------------------------

fn starts_with_digit(name: &str) -> bool {
    name.chars()
        .next()
        .is_some_and(char::is_numeric)
}

/// Sorted distinct customer names of `rows`.
pub fn customer_options(rows: &[SaleRow]) -> Vec<String> {
    let mut names: Vec<String> = rows.iter().map(|r| r.customer_name.clone()).collect();
    names.sort();
    names.dedup();
    names
}

/// Checked state per customer name. Names keep their state while the
/// option list is refreshed; new names start checked.
#[derive(Debug, Clone, Default)]
pub struct CustomerSelection {
    checked: BTreeMap<String, bool>,
    options: Vec<String>,
}

impl CustomerSelection {
    pub fn refresh(&mut self, options: Vec<String>) {
        for name in &options {
            self.checked.entry(name.clone()).or_insert(true);
        }
        self.options = options;
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn is_checked(&self, name: &str) -> bool {
        self.checked.get(name).copied().unwrap_or(false)
    }

    pub fn set(&mut self, name: &str, value: bool) {
        if let Some(flag) = self.checked.get_mut(name) {
            *flag = value;
        }
    }

    pub fn toggle(&mut self, name: &str) {
        if let Some(flag) = self.checked.get_mut(name) {
            *flag = !*flag;
        }
    }

    pub fn select_all(&mut self) {
        for name in &self.options {
            self.checked.insert(name.clone(), true);
        }
    }

    pub fn select_none(&mut self) {
        for name in &self.options {
            self.checked.insert(name.clone(), false);
        }
    }

    pub fn deselect_numeric_leading(&mut self) {
        for name in self.options.iter().filter(|n| starts_with_digit(n)) {
            self.checked.insert(name.clone(), false);
        }
    }

    /// Checked names among the current options, in option order.
    pub fn selected(&self) -> Vec<&str> {
        self.options
            .iter()
            .filter(|n| self.is_checked(n))
            .map(|n| n.as_str())
            .collect()
    }
}

/// Rows whose customer is checked; an empty selection is a warning.
pub fn select_customers(rows: &[SaleRow], selection: &CustomerSelection) -> Result<Vec<SaleRow>> {
    let selected = selection.selected();
    if selected.is_empty() {
        return Err(OroshiError::EmptySelection);
    }
    Ok(rows
        .iter()
        .filter(|r| selected.contains(&r.customer_name.as_str()))
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    fn row(customer: &str, product: &str) -> SaleRow {
        SaleRow {
            customer_code: Some("C1".into()),
            customer_name: customer.into(),
            sale_date: None,
            year_month: None,
            product_name: if product.is_empty() {
                Cell::Empty
            } else {
                Cell::Text(product.into())
            },
            quantity: Some(1.0),
            sale_amount: Some(100.0),
            sale_type: Cell::Text("売上".into()),
        }
    }

    fn products(rows: &[SaleRow]) -> Vec<String> {
        rows.iter().map(|r| r.product_name.to_text()).collect()
    }

    fn sample() -> Vec<SaleRow> {
        vec![
            row("山田商店", "Nintendo Switch 本体"),
            row("山田商店", "NSソフト マリオ"),
            row("鈴木玩具", "トミカ No.1"),
            row("鈴木玩具", "PMカード 拡張パック"),
            row("佐藤", "ポケモンカード"),
            row("佐藤", "HG 機動戦士ガンダム"),
            row("佐藤", ""),
        ]
    }

    #[test]
    fn test_no_conditions_keeps_everything() {
        let out = apply_filter(&sample(), &FilterOptions::default()).unwrap();
        assert_eq!(out.len(), 7);
    }

    #[test]
    fn test_switch_prefixes() {
        let opts = FilterOptions { switch: true, ..Default::default() };
        let out = apply_filter(&sample(), &opts).unwrap();
        assert_eq!(products(&out), vec!["Nintendo Switch 本体", "NSソフト マリオ"]);
    }

    #[test]
    fn test_not_switch_keeps_missing_products() {
        let opts = FilterOptions { not_switch: true, ..Default::default() };
        let out = apply_filter(&sample(), &opts).unwrap();
        assert_eq!(out.len(), 5);
        assert!(out.iter().any(|r| r.product_name == Cell::Empty));
    }

    #[test]
    fn test_switch_and_not_switch_are_exclusive() {
        let opts = FilterOptions { switch: true, not_switch: true, ..Default::default() };
        assert!(apply_filter(&sample(), &opts).unwrap().is_empty());
    }

    #[test]
    fn test_pokemon_card_uses_literal_code_prefix() {
        let opts = FilterOptions { pokemon_card: true, ..Default::default() };
        let out = apply_filter(&sample(), &opts).unwrap();
        assert_eq!(products(&out), vec!["PMカード 拡張パック"]);
    }

    #[test]
    fn test_gundam_matches_anywhere() {
        let opts = FilterOptions { gundam: true, ..Default::default() };
        let out = apply_filter(&sample(), &opts).unwrap();
        assert_eq!(products(&out), vec!["HG 機動戦士ガンダム"]);
    }

    #[test]
    fn test_conditions_intersect() {
        let opts = FilterOptions { tomica: true, keyword: "No\\.1".into(), ..Default::default() };
        assert_eq!(apply_filter(&sample(), &opts).unwrap().len(), 1);
        let opts = FilterOptions { tomica: true, gundam: true, ..Default::default() };
        assert!(apply_filter(&sample(), &opts).unwrap().is_empty());
    }

    #[test]
    fn test_keyword_is_a_pattern() {
        let opts = FilterOptions { keyword: "マリオ|本体".into(), ..Default::default() };
        assert_eq!(apply_filter(&sample(), &opts).unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_keyword_is_reported() {
        let opts = FilterOptions { keyword: "(ガンダム".into(), ..Default::default() };
        let err = apply_filter(&sample(), &opts).unwrap_err();
        assert!(matches!(err, OroshiError::Pattern { .. }));
        assert!(err.is_warning());
    }

    #[test]
    fn test_numeric_product_never_matches() {
        let mut rows = sample();
        rows[0].product_name = Cell::Number(1.0);
        let opts = FilterOptions { keyword: "1".into(), ..Default::default() };
        assert_eq!(products(&apply_filter(&rows, &opts).unwrap()), vec!["トミカ No.1"]);
    }

    #[test]
    fn test_customer_options_sorted_distinct() {
        assert_eq!(customer_options(&sample()), vec!["佐藤", "山田商店", "鈴木玩具"]);
    }

    #[test]
    fn test_selection_defaults_checked_and_bulk_actions() {
        let mut sel = CustomerSelection::default();
        sel.refresh(vec!["1番店".into(), "３丁目店".into(), "山田".into()]);
        assert_eq!(sel.selected().len(), 3);

        sel.deselect_numeric_leading();
        assert_eq!(sel.selected(), vec!["山田"]);

        sel.select_none();
        assert!(sel.selected().is_empty());

        sel.select_all();
        assert_eq!(sel.selected().len(), 3);

        sel.toggle("山田");
        assert!(!sel.is_checked("山田"));
    }

    #[test]
    fn test_any_unicode_digit_counts_as_numeric() {
        let mut sel = CustomerSelection::default();
        sel.refresh(vec!["①号店".into(), "٣店".into(), "一番店".into(), "Aショップ".into()]);
        sel.deselect_numeric_leading();
        assert_eq!(sel.selected(), vec!["一番店", "Aショップ"]);
    }

    #[test]
    fn test_selection_survives_refresh() {
        let mut sel = CustomerSelection::default();
        sel.refresh(vec!["A".into(), "B".into()]);
        sel.set("A", false);
        sel.refresh(vec!["A".into(), "C".into()]);
        assert_eq!(sel.selected(), vec!["C"]);
        assert!(!sel.is_checked("A"));
    }

    #[test]
    fn test_select_customers() {
        let mut sel = CustomerSelection::default();
        sel.refresh(customer_options(&sample()));
        sel.set("佐藤", false);
        let rows = select_customers(&sample(), &sel).unwrap();
        assert_eq!(rows.len(), 4);

        sel.select_none();
        assert!(matches!(
            select_customers(&sample(), &sel),
            Err(OroshiError::EmptySelection)
        ));
    }
}
