use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::info;

use crate::aggregator::summarize;
use crate::error::{OroshiError, Result};
use crate::exporter::{default_filename, validate_filename, write_export};
use crate::filter::{apply_filter, customer_options, select_customers, CustomerSelection, FilterOptions};
use crate::loader::{load_file, validate_columns};
use crate::models::{SaleRow, SummaryRow};
use crate::normalizer::{normalize, NormalizeReport};

struct Upload {
    source: PathBuf,
    checksum: String,
    rows: Vec<SaleRow>,
    report: NormalizeReport,
}

/// Everything one interactive run remembers between user actions.
///
/// Each operation either commits its result or returns an error and leaves
/// the session exactly as it was.
pub struct Session {
    upload: Option<Upload>,
    options: FilterOptions,
    snapshot: Option<Vec<SaleRow>>,
    proceeded: bool,
    selection: CustomerSelection,
    filename: String,
}

impl Session {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            upload: None,
            options: FilterOptions::default(),
            snapshot: None,
            proceeded: false,
            selection: CustomerSelection::default(),
            filename: default_filename(now),
        }
    }

    /// Load, validate and normalize a spreadsheet. Re-uploading identical
    /// content keeps the current table and filter state.
    pub fn upload(&mut self, path: &Path) -> Result<&NormalizeReport> {
        let loaded = load_file(path)?;
        let same_content = self
            .upload
            .as_ref()
            .is_some_and(|u| u.checksum == loaded.checksum);
        if !same_content {
            validate_columns(&loaded.table)?;
            let (rows, report) = normalize(&loaded.table)?;
            self.upload = Some(Upload {
                source: path.to_path_buf(),
                checksum: loaded.checksum,
                rows,
                report,
            });
            self.snapshot = None;
            self.proceeded = false;
            self.selection = CustomerSelection::default();
        } else if let Some(upload) = self.upload.as_mut() {
            info!(file = %path.display(), "content unchanged, reusing table");
            upload.source = path.to_path_buf();
        }
        self.upload_ref().map(|u| &u.report)
    }

    fn upload_ref(&self) -> Result<&Upload> {
        self.upload
            .as_ref()
            .ok_or_else(|| OroshiError::Other("Upload a spreadsheet first.".into()))
    }

    pub fn source(&self) -> Option<&Path> {
        self.upload.as_ref().map(|u| u.source.as_path())
    }

    pub fn rows(&self) -> &[SaleRow] {
        self.upload
            .as_ref()
            .map(|u| u.rows.as_slice())
            .unwrap_or_default()
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// Filter the normalized table and commit the result as the applied
    /// snapshot. Returns the number of rows kept.
    pub fn apply_filter(&mut self, options: FilterOptions) -> Result<usize> {
        let filtered = apply_filter(&self.upload_ref()?.rows, &options)?;
        let count = filtered.len();
        self.selection.refresh(customer_options(&filtered));
        self.options = options;
        self.snapshot = Some(filtered);
        self.proceeded = false;
        Ok(count)
    }

    pub fn filtered(&self) -> Option<&[SaleRow]> {
        self.snapshot.as_deref()
    }

    pub fn proceed(&mut self) -> Result<()> {
        if self.snapshot.is_none() {
            return Err(OroshiError::Other("Apply the filter first.".into()));
        }
        self.proceeded = true;
        Ok(())
    }

    pub fn selection(&self) -> &CustomerSelection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut CustomerSelection {
        &mut self.selection
    }

    /// Applied snapshot narrowed to the checked customers.
    pub fn selected_rows(&self) -> Result<Vec<SaleRow>> {
        let snapshot = self
            .snapshot
            .as_deref()
            .ok_or_else(|| OroshiError::Other("Apply the filter first.".into()))?;
        select_customers(snapshot, &self.selection)
    }

    pub fn summary(&self) -> Result<Vec<SummaryRow>> {
        if !self.proceeded {
            return Err(OroshiError::Other("Proceed to customer selection first.".into()));
        }
        summarize(&self.selected_rows()?)
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn confirm_filename(&mut self, name: &str) -> Result<()> {
        self.filename = validate_filename(name)?.to_string();
        Ok(())
    }

    pub fn export(&self, dir: &Path) -> Result<PathBuf> {
        let rows = self.summary()?;
        write_export(dir, &self.filename, &rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporter::read_summary;
    use chrono::NaiveDate;

    const HEADER: &str = "得意先コード,得意先名１,得意先名２,売上日付,商品名,数量,売上金額,売上区分";

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(10, 30, 0).unwrap()
    }

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("{HEADER}\n{body}")).unwrap();
        path
    }

    fn scenario(dir: &Path) -> PathBuf {
        write(
            dir,
            "sales.csv",
            "A1,（株）山田,商店,2024-04-01,Nintendo Switch 本体,1,30000,売上\n\
             A1,（株）山田,商店,2024-04-15,トミカ,2,1000,売上\n\
             B2,1号店,,2024-04-02,トミカ,1,500,売上\n\
             C3,現金売上太郎,,2024-04-03,Nintendo Switch 本体,1,30000,売上\n\
             D4,佐藤,,2024-04-04,Nintendo Switch 本体,1,0,売上\n",
        )
    }

    #[test]
    fn test_full_pass() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(now());
        assert_eq!(session.filename(), "集計結果_20240501_1030.csv");

        let report = session.upload(&scenario(dir.path())).unwrap();
        assert_eq!(report.retained, 3);

        let kept = session
            .apply_filter(FilterOptions { switch: true, ..Default::default() })
            .unwrap();
        assert_eq!(kept, 1);
        session.proceed().unwrap();
        assert_eq!(session.selection().options(), ["山田商店"]);

        let summary = session.summary().unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].customer_code, "A1");
        assert_eq!(summary[0].customer_name, "山田商店");
        assert_eq!(summary[0].year_month.to_string(), "2024-04");
        assert_eq!(summary[0].unique_dates, 1);
        assert_eq!(summary[0].quantity_total, 1.0);
        assert_eq!(summary[0].amount_total, 30000.0);

        session.confirm_filename("result.csv").unwrap();
        let path = session.export(&dir.path().join("exports")).unwrap();
        let back = read_summary(&path).unwrap();
        assert_eq!(back, summary);
    }

    #[test]
    fn test_numeric_leading_customers_deselected() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(now());
        session.upload(&scenario(dir.path())).unwrap();
        session.apply_filter(FilterOptions { tomica: true, ..Default::default() }).unwrap();
        session.selection_mut().deselect_numeric_leading();
        let rows = session.selected_rows().unwrap();
        assert!(rows.iter().all(|r| r.customer_name == "山田商店"));
    }

    #[test]
    fn test_empty_selection_is_warning_and_keeps_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(now());
        session.upload(&scenario(dir.path())).unwrap();
        session.apply_filter(FilterOptions::default()).unwrap();
        session.proceed().unwrap();
        session.selection_mut().select_none();
        let err = session.summary().unwrap_err();
        assert!(matches!(err, OroshiError::EmptySelection));
        assert_eq!(session.filtered().unwrap().len(), 3);
    }

    #[test]
    fn test_invalid_keyword_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(now());
        session.upload(&scenario(dir.path())).unwrap();
        session.apply_filter(FilterOptions { tomica: true, ..Default::default() }).unwrap();
        let err = session
            .apply_filter(FilterOptions { keyword: "[".into(), ..Default::default() })
            .unwrap_err();
        assert!(err.is_warning());
        assert_eq!(session.filtered().unwrap().len(), 2);
        assert!(session.options().tomica);
    }

    #[test]
    fn test_schema_error_keeps_previous_upload() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(now());
        session.upload(&scenario(dir.path())).unwrap();
        let bad = dir.path().join("bad.csv");
        std::fs::write(&bad, "得意先名１,数量\n山田,1\n").unwrap();
        assert!(matches!(session.upload(&bad), Err(OroshiError::Schema { .. })));
        assert_eq!(session.rows().len(), 3);
    }

    #[test]
    fn test_identical_upload_keeps_filter_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(now());
        let path = scenario(dir.path());
        session.upload(&path).unwrap();
        session.apply_filter(FilterOptions { tomica: true, ..Default::default() }).unwrap();
        session.upload(&path).unwrap();
        assert!(session.filtered().is_some());

        let other = write(dir.path(), "other.csv", "Z9,別店,,2024-06-01,x,1,1,売上\n");
        session.upload(&other).unwrap();
        assert!(session.filtered().is_none());
        assert_eq!(session.source(), Some(other.as_path()));
    }

    #[test]
    fn test_identical_content_from_new_path_updates_source() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(now());
        let first = scenario(dir.path());
        session.upload(&first).unwrap();
        session.apply_filter(FilterOptions { tomica: true, ..Default::default() }).unwrap();

        let copy = dir.path().join("copy.csv");
        std::fs::copy(&first, &copy).unwrap();
        session.upload(&copy).unwrap();
        assert_eq!(session.source(), Some(copy.as_path()));
        assert!(session.filtered().is_some());
    }

    #[test]
    fn test_empty_filename_refused() {
        let mut session = Session::new(now());
        assert!(matches!(session.confirm_filename(" "), Err(OroshiError::InvalidFilename)));
        assert_eq!(session.filename(), "集計結果_20240501_1030.csv");
    }

    #[test]
    fn test_operations_before_upload() {
        let mut session = Session::new(now());
        assert!(session.apply_filter(FilterOptions::default()).is_err());
        assert!(session.proceed().is_err());
        assert!(session.summary().is_err());
    }

    #[test]
    fn test_refiltering_requires_proceed_again() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(now());
        session.upload(&scenario(dir.path())).unwrap();
        session.apply_filter(FilterOptions::default()).unwrap();
        session.proceed().unwrap();
        assert!(session.summary().is_ok());
        session.apply_filter(FilterOptions { tomica: true, ..Default::default() }).unwrap();
        assert!(session.summary().is_err());
    }
}
