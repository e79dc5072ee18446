use std::path::{Path, PathBuf};

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Row, Table},
    Frame,
};

use crate::cli::text::format_load_report;
use crate::error::Result;
use crate::filter::{FilterOptions, ALL_CATEGORIES};
use crate::fmt::plain_number;
use crate::models::SummaryRow;
use crate::session::Session;
use crate::settings::{get_export_dir, load_settings};
use crate::tui::{
    amount_span, checkbox, run_view, status_span, Status, View, ViewAction, FOOTER_STYLE,
    HEADER_STYLE, SELECTED_STYLE,
};

const KEYWORD_ROW: usize = ALL_CATEGORIES.len();

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Filter,
    Preview,
    Customers,
    Export,
}

struct SessionView {
    session: Session,
    stage: Stage,
    draft: FilterOptions,
    cursor: usize,
    offset: usize,
    filename_input: String,
    summary: Vec<SummaryRow>,
    export_dir: PathBuf,
    preview_rows: usize,
    status: Status,
}

impl SessionView {
    fn new(session: Session, export_dir: PathBuf, preview_rows: usize) -> Self {
        let filename_input = session.filename().to_string();
        Self {
            session,
            stage: Stage::Filter,
            draft: FilterOptions::default(),
            cursor: 0,
            offset: 0,
            filename_input,
            summary: Vec::new(),
            export_dir,
            preview_rows,
            status: None,
        }
    }

    fn fail(&mut self, e: crate::error::OroshiError) {
        self.status = Some((e.to_string(), true));
    }

    // -- key handling -------------------------------------------------------

    fn filter_key(&mut self, code: KeyCode) -> ViewAction {
        match code {
            KeyCode::Esc => return ViewAction::Close,
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => self.cursor = (self.cursor + 1).min(KEYWORD_ROW),
            KeyCode::Enter => match self.session.apply_filter(self.draft.clone()) {
                Ok(n) => {
                    self.status = Some((format!("{n} rows after filtering"), false));
                    self.stage = Stage::Preview;
                    self.offset = 0;
                }
                Err(e) => self.fail(e),
            },
            KeyCode::Backspace if self.cursor == KEYWORD_ROW => {
                self.draft.keyword.pop();
            }
            KeyCode::Char(c) if self.cursor == KEYWORD_ROW => self.draft.keyword.push(c),
            KeyCode::Char('q') => return ViewAction::Close,
            KeyCode::Char(' ') => {
                if let Some(category) = ALL_CATEGORIES.get(self.cursor) {
                    self.draft.toggle(*category);
                }
            }
            _ => {}
        }
        ViewAction::Continue
    }

    fn preview_key(&mut self, code: KeyCode) -> ViewAction {
        let total = self.session.filtered().map_or(0, |r| r.len().min(self.preview_rows));
        match code {
            KeyCode::Esc => {
                self.stage = Stage::Filter;
                self.cursor = 0;
                self.status = None;
            }
            KeyCode::Up => self.offset = self.offset.saturating_sub(1),
            KeyCode::Down => self.offset = (self.offset + 1).min(total.saturating_sub(1)),
            KeyCode::Enter => match self.session.proceed() {
                Ok(()) => {
                    self.stage = Stage::Customers;
                    self.cursor = 0;
                    self.status = None;
                }
                Err(e) => self.fail(e),
            },
            KeyCode::Char('q') => return ViewAction::Close,
            _ => {}
        }
        ViewAction::Continue
    }

    fn customers_key(&mut self, code: KeyCode) -> ViewAction {
        let count = self.session.selection().options().len();
        match code {
            KeyCode::Esc => {
                self.stage = Stage::Preview;
                self.cursor = 0;
                self.status = None;
            }
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => self.cursor = (self.cursor + 1).min(count.saturating_sub(1)),
            KeyCode::Char(' ') => {
                if let Some(name) = self.session.selection().options().get(self.cursor).cloned() {
                    self.session.selection_mut().toggle(&name);
                }
            }
            KeyCode::Char('a') => self.session.selection_mut().select_all(),
            KeyCode::Char('n') => self.session.selection_mut().select_none(),
            KeyCode::Char('d') => self.session.selection_mut().deselect_numeric_leading(),
            KeyCode::Enter => match self.session.summary() {
                Ok(rows) => {
                    self.status = Some((format!("{} groups", rows.len()), false));
                    self.summary = rows;
                    self.stage = Stage::Export;
                }
                Err(e) => self.fail(e),
            },
            KeyCode::Char('q') => return ViewAction::Close,
            _ => {}
        }
        ViewAction::Continue
    }

    fn export_key(&mut self, code: KeyCode) -> ViewAction {
        match code {
            KeyCode::Esc => {
                self.stage = Stage::Customers;
                let count = self.session.selection().options().len();
                self.cursor = self.cursor.min(count.saturating_sub(1));
                self.status = None;
            }
            KeyCode::Char(c) => {
                self.filename_input.push(c);
                self.status = None;
            }
            KeyCode::Backspace => {
                self.filename_input.pop();
                self.status = None;
            }
            KeyCode::Enter => {
                let written = self
                    .session
                    .confirm_filename(&self.filename_input)
                    .and_then(|_| self.session.export(&self.export_dir));
                match written {
                    Ok(path) => self.status = Some((format!("Saved {}", path.display()), false)),
                    Err(e) => self.fail(e),
                }
            }
            _ => {}
        }
        ViewAction::Continue
    }

    // -- drawing ------------------------------------------------------------

    fn draw_filter(&self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                " Product filters (each checked box narrows the rows)",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        for (i, category) in ALL_CATEGORIES.iter().enumerate() {
            let text = format!(
                "   {} {}",
                checkbox(self.draft.is_enabled(*category)),
                category.label()
            );
            let style = if i == self.cursor { SELECTED_STYLE } else { Style::default() };
            lines.push(Line::from(Span::styled(text, style)));
        }
        lines.push(Line::from(""));
        let cursor = if self.cursor == KEYWORD_ROW { "_" } else { "" };
        let label_style = if self.cursor == KEYWORD_ROW {
            SELECTED_STYLE
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        lines.push(Line::from(vec![
            Span::styled("   Keyword  ", label_style),
            Span::styled(
                format!("{}{cursor}", self.draft.keyword),
                Style::default().fg(Color::Cyan),
            ),
        ]));
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn draw_preview(&self, frame: &mut Frame, area: Rect) {
        let rows = self.session.filtered().unwrap_or_default();
        let body: Vec<Row> = rows
            .iter()
            .take(self.preview_rows)
            .skip(self.offset)
            .take(area.height.saturating_sub(1) as usize)
            .map(|r| {
                Row::new(vec![
                    Line::from(r.sale_date.map(|d| d.to_string()).unwrap_or_default()),
                    Line::from(r.customer_name.clone()),
                    Line::from(r.product_name.to_text()),
                    Line::from(r.sale_amount.map(amount_span).unwrap_or_else(|| Span::raw(""))),
                ])
            })
            .collect();
        let table = Table::new(
            body,
            [
                Constraint::Length(11),
                Constraint::Percentage(30),
                Constraint::Fill(1),
                Constraint::Length(14),
            ],
        )
        .header(Row::new(vec!["売上日付", "得意先名", "商品名", "売上金額"]).style(HEADER_STYLE));
        frame.render_widget(table, area);
    }

    fn draw_customers(&self, frame: &mut Frame, area: Rect) {
        let selection = self.session.selection();
        let options = selection.options();
        let height = area.height.saturating_sub(2).max(1) as usize;
        let start = self.cursor.saturating_sub(height - 1);

        let mut lines = vec![
            Line::from(Span::styled(
                format!(" Customers ({} of {} selected)", selection.selected().len(), options.len()),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        for (i, name) in options.iter().enumerate().skip(start).take(height) {
            let text = format!("   {} {name}", checkbox(selection.is_checked(name)));
            let style = if i == self.cursor { SELECTED_STYLE } else { Style::default() };
            lines.push(Line::from(Span::styled(text, style)));
        }
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn draw_export(&self, frame: &mut Frame, area: Rect) {
        let [table_area, input_area] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(2)]).areas(area);

        let body: Vec<Row> = self
            .summary
            .iter()
            .map(|r| {
                Row::new(vec![
                    Line::from(r.customer_code.clone()),
                    Line::from(r.customer_name.clone()),
                    Line::from(r.year_month.to_string()),
                    Line::from(r.unique_dates.to_string()),
                    Line::from(plain_number(r.quantity_total)),
                    Line::from(amount_span(r.amount_total)),
                ])
            })
            .collect();
        let table = Table::new(
            body,
            [
                Constraint::Length(12),
                Constraint::Fill(1),
                Constraint::Length(8),
                Constraint::Length(18),
                Constraint::Length(10),
                Constraint::Length(14),
            ],
        )
        .header(Row::new(crate::columns::SUMMARY_HEADER.to_vec()).style(HEADER_STYLE));
        frame.render_widget(table, table_area);

        let input = Line::from(vec![
            Span::styled(" File name  ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                format!("{}_", self.filename_input),
                Style::default().fg(Color::Cyan),
            ),
        ]);
        frame.render_widget(Paragraph::new(vec![Line::from(""), input]), input_area);
    }
}

impl View for SessionView {
    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, sep, content_area, status_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let source = self
            .session
            .source()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        frame.render_widget(
            Paragraph::new(format!(" 集計  {source}")).style(HEADER_STYLE),
            header_area,
        );
        let sep_line = "\u{2501}".repeat(area.width as usize);
        frame.render_widget(
            Paragraph::new(sep_line.as_str()).style(Style::default().fg(Color::DarkGray)),
            sep,
        );

        match self.stage {
            Stage::Filter => self.draw_filter(frame, content_area),
            Stage::Preview => self.draw_preview(frame, content_area),
            Stage::Customers => self.draw_customers(frame, content_area),
            Stage::Export => self.draw_export(frame, content_area),
        }

        frame.render_widget(Paragraph::new(status_span(&self.status)), status_area);

        let hints = match self.stage {
            Stage::Filter => " Space=toggle  \u{2191}\u{2193}=move  Enter=apply filter  Esc=quit",
            Stage::Preview => " \u{2191}\u{2193}=scroll  Enter=next  Esc=back",
            Stage::Customers => {
                " Space=toggle  a=all  n=none  d=uncheck numeric names  Enter=summarize  Esc=back"
            }
            Stage::Export => " Type file name  Enter=save  Esc=back  Ctrl+C=quit",
        };
        frame.render_widget(Paragraph::new(hints).style(FOOTER_STYLE), hints_area);
    }

    fn handle_key(&mut self, code: KeyCode) -> ViewAction {
        match self.stage {
            Stage::Filter => self.filter_key(code),
            Stage::Preview => self.preview_key(code),
            Stage::Customers => self.customers_key(code),
            Stage::Export => self.export_key(code),
        }
    }
}

pub fn run(file: &str) -> Result<()> {
    let mut session = Session::new(chrono::Local::now().naive_local());
    let report = session.upload(Path::new(file))?;
    println!("{}", format_load_report(report));

    let settings = load_settings();
    let mut view = SessionView::new(session, get_export_dir(), settings.preview_rows);
    run_view(&mut view)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALES: &str = "\
得意先コード,得意先名１,得意先名２,売上日付,商品名,数量,売上金額,売上区分
A1,（株）山田,商店,2024-04-01,Nintendo Switch 本体,1,30000,売上
A1,（株）山田,商店,2024-04-15,トミカ,2,1000,売上
B2,2号店,,2024-04-02,トミカ,1,500,売上
";

    fn view(dir: &Path) -> SessionView {
        let path = dir.join("sales.csv");
        std::fs::write(&path, SALES).unwrap();
        let mut session = Session::new(chrono::Local::now().naive_local());
        session.upload(&path).unwrap();
        SessionView::new(session, dir.join("out"), 100)
    }

    fn keys(v: &mut SessionView, codes: &[KeyCode]) {
        for code in codes {
            v.handle_key(*code);
        }
    }

    #[test]
    fn test_walk_through_to_export() {
        let dir = tempfile::tempdir().unwrap();
        let mut v = view(dir.path());

        keys(&mut v, &[KeyCode::Down, KeyCode::Down, KeyCode::Char(' '), KeyCode::Enter]);
        assert!(v.draft.tomica);
        assert_eq!(v.stage, Stage::Preview);
        assert_eq!(v.session.filtered().unwrap().len(), 2);

        keys(&mut v, &[KeyCode::Enter, KeyCode::Char('d'), KeyCode::Enter]);
        assert_eq!(v.stage, Stage::Export);
        assert_eq!(v.summary.len(), 1);
        assert_eq!(v.summary[0].customer_name, "山田商店");

        v.filename_input.clear();
        keys(&mut v, &[KeyCode::Char('a'), KeyCode::Char('.'), KeyCode::Char('c')]);
        keys(&mut v, &[KeyCode::Char('s'), KeyCode::Char('v'), KeyCode::Enter]);
        assert!(dir.path().join("out").join("a.csv").exists());
        assert!(matches!(v.status, Some((_, false))));
    }

    #[test]
    fn test_keyword_typing_and_bad_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let mut v = view(dir.path());
        v.cursor = KEYWORD_ROW;
        keys(&mut v, &[KeyCode::Char('('), KeyCode::Char('q'), KeyCode::Enter]);
        assert_eq!(v.draft.keyword, "(q");
        assert_eq!(v.stage, Stage::Filter);
        assert!(matches!(v.status, Some((_, true))));
    }

    #[test]
    fn test_empty_selection_stays_on_customers() {
        let dir = tempfile::tempdir().unwrap();
        let mut v = view(dir.path());
        keys(&mut v, &[KeyCode::Enter, KeyCode::Enter, KeyCode::Char('n'), KeyCode::Enter]);
        assert_eq!(v.stage, Stage::Customers);
        assert!(matches!(v.status, Some((_, true))));
    }

    #[test]
    fn test_empty_filename_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let mut v = view(dir.path());
        keys(&mut v, &[KeyCode::Enter, KeyCode::Enter, KeyCode::Enter]);
        assert_eq!(v.stage, Stage::Export);
        v.filename_input.clear();
        keys(&mut v, &[KeyCode::Enter]);
        assert!(matches!(v.status, Some((_, true))));
        assert!(!dir.path().join("out").exists());
    }

    fn many_customers(dir: &Path, count: usize) -> SessionView {
        let mut body = String::from(
            "得意先コード,得意先名１,得意先名２,売上日付,商品名,数量,売上金額,売上区分\n",
        );
        for i in 0..count {
            body.push_str(&format!("C{i},店舗{i},,2024-04-01,トミカ,1,100,売上\n"));
        }
        let path = dir.join("many.csv");
        std::fs::write(&path, body).unwrap();
        let mut session = Session::new(chrono::Local::now().naive_local());
        session.upload(&path).unwrap();
        SessionView::new(session, dir.join("out"), 100)
    }

    #[test]
    fn test_back_to_filter_from_deep_customer_row() {
        let dir = tempfile::tempdir().unwrap();
        let mut v = many_customers(dir.path(), 8);
        keys(&mut v, &[KeyCode::Enter, KeyCode::Enter]);
        assert_eq!(v.stage, Stage::Customers);
        keys(&mut v, &[KeyCode::Down; 7]);
        assert_eq!(v.cursor, 7);

        keys(&mut v, &[KeyCode::Esc, KeyCode::Esc]);
        assert_eq!(v.stage, Stage::Filter);
        assert_eq!(v.cursor, 0);
        keys(&mut v, &[KeyCode::Char(' ')]);
        assert!(v.draft.switch);
        keys(&mut v, &[KeyCode::Char(' ')]);
        assert!(!v.draft.switch);
    }

    #[test]
    fn test_filter_keys_after_returning_from_export() {
        let dir = tempfile::tempdir().unwrap();
        let mut v = many_customers(dir.path(), 8);
        keys(&mut v, &[KeyCode::Enter, KeyCode::Enter, KeyCode::Enter]);
        assert_eq!(v.stage, Stage::Export);

        keys(&mut v, &[KeyCode::Esc, KeyCode::Esc, KeyCode::Esc]);
        assert_eq!(v.stage, Stage::Filter);
        keys(&mut v, &[KeyCode::Down, KeyCode::Down, KeyCode::Char(' ')]);
        assert!(v.draft.tomica);
        keys(&mut v, &[KeyCode::Down; 10]);
        assert_eq!(v.cursor, KEYWORD_ROW);
        keys(&mut v, &[KeyCode::Char('ミ'), KeyCode::Enter]);
        assert_eq!(v.draft.keyword, "ミ");
        assert_eq!(v.stage, Stage::Preview);
        assert_eq!(v.session.filtered().unwrap().len(), 8);
    }

    #[test]
    fn test_customer_keys_after_returning_from_export() {
        let dir = tempfile::tempdir().unwrap();
        let mut v = many_customers(dir.path(), 3);
        keys(&mut v, &[KeyCode::Enter, KeyCode::Enter, KeyCode::Down, KeyCode::Down]);
        keys(&mut v, &[KeyCode::Enter, KeyCode::Esc]);
        assert_eq!(v.stage, Stage::Customers);
        assert_eq!(v.cursor, 2);

        keys(&mut v, &[KeyCode::Char(' ')]);
        assert!(!v.session.selection().is_checked("店舗2"));
        keys(&mut v, &[KeyCode::Enter]);
        assert_eq!(v.stage, Stage::Export);
        assert_eq!(v.summary.len(), 2);
    }

    #[test]
    fn test_preview_keys_after_returning_from_customers() {
        let dir = tempfile::tempdir().unwrap();
        let mut v = many_customers(dir.path(), 5);
        keys(&mut v, &[KeyCode::Enter, KeyCode::Enter, KeyCode::Down, KeyCode::Down]);
        keys(&mut v, &[KeyCode::Esc]);
        assert_eq!(v.stage, Stage::Preview);
        keys(&mut v, &[KeyCode::Down; 9]);
        assert_eq!(v.offset, 4);
        keys(&mut v, &[KeyCode::Enter]);
        assert_eq!(v.stage, Stage::Customers);
        assert_eq!(v.cursor, 0);
    }

    #[test]
    fn test_quit_from_filter() {
        let dir = tempfile::tempdir().unwrap();
        let mut v = view(dir.path());
        assert!(matches!(v.handle_key(KeyCode::Char('q')), ViewAction::Close));
    }
}
