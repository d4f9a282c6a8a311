//! Drawing helpers that turn render-model pieces into ratatui widgets

use crate::core::{StatusLevel, StatusLine};
use crate::services::renderer::{
    ColumnChecklist, RegressionFormView, ReportView, TableView, UniqueCell,
};
use crate::tui::action::{Action, ActionCategory};
use crate::tui::keybindings::KeyBindings;
use crate::tui::theme::Theme;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
};

const MAX_COLUMN_WIDTH: usize = 28;

fn pane_block<'a>(title: impl Into<Line<'a>>, theme: &Theme, focused: bool) -> Block<'a> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(theme.border_style(focused))
}

/// Row height for an enumerated list cell
fn list_height(items: usize) -> u16 {
    u16::try_from(items.max(1)).unwrap_or(u16::MAX)
}

/// Column widths sized to the widest header or cell, capped
fn widths_for(headers: &[String], rows: &[Vec<String>]) -> Vec<Constraint> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let widest = rows
                .iter()
                .filter_map(|r| r.get(idx))
                .map(|c| c.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(1);
            Constraint::Length(widest.clamp(1, MAX_COLUMN_WIDTH) as u16)
        })
        .collect()
}

/// Draw a preview-style table; the first header gets the key style
pub fn draw_table(frame: &mut Frame, area: Rect, title: &str, view: Option<&TableView>, theme: &Theme, focused: bool) {
    let block = pane_block(title.to_string(), theme, focused);
    let Some(view) = view else {
        let hint = Paragraph::new("Nothing to show yet").style(theme.locked_style()).block(block);
        frame.render_widget(hint, area);
        return;
    };

    let header = Row::new(view.headers.iter().map(|h| {
        let style = if h.highlighted { theme.key_header_style() } else { theme.header_style() };
        Cell::from(h.label.clone()).style(style)
    }));
    let rows = view
        .rows
        .iter()
        .map(|r| Row::new(r.iter().map(|c| Cell::from(c.clone()))).style(theme.normal_style()));
    let labels: Vec<String> = view.headers.iter().map(|h| h.label.clone()).collect();
    let table = Table::new(rows, widths_for(&labels, &view.rows))
        .header(header)
        .column_spacing(1)
        .block(block);
    frame.render_widget(table, area);
}

/// Column picker with a cursor; the submit hint reflects whether plotting is allowed
pub fn draw_column_picker(
    frame: &mut Frame,
    area: Rect,
    picker: &ColumnChecklist,
    cursor: usize,
    theme: &Theme,
    focused: bool,
) {
    let items: Vec<ListItem> = picker
        .items
        .iter()
        .map(|item| {
            let mark = if item.checked { "[x] " } else { "[ ] " };
            let style = if item.checked { theme.checked_style() } else { theme.normal_style() };
            ListItem::new(Line::from(vec![Span::styled(mark, style), Span::raw(item.label.clone())]))
        })
        .collect();
    let hint = if picker.can_submit {
        Span::styled(" Enter: plot ", theme.action_style())
    } else {
        Span::styled(" select 2+ to plot ", theme.locked_style())
    };
    let block = pane_block(" Select Columns ", theme, focused).title_bottom(Line::from(hint));
    let list = List::new(items)
        .block(block)
        .highlight_style(theme.cursor_style());
    let mut state = ListState::default();
    if focused && !picker.items.is_empty() {
        state.select(Some(cursor.min(picker.items.len() - 1)));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

/// Read-only regression form plus the last MSE, if any
pub fn draw_regression_form(
    frame: &mut Frame,
    area: Rect,
    form: &RegressionFormView,
    mse: Option<f64>,
    theme: &Theme,
    focused: bool,
) {
    let mut lines = vec![Line::styled("Feature columns", theme.header_style())];
    for feature in &form.features {
        lines.push(Line::styled(format!("  [x] {}", feature.label), theme.locked_style()));
    }
    lines.push(Line::default());
    lines.push(Line::styled("Target column", theme.header_style()));
    if let Some(target) = &form.target {
        lines.push(Line::styled(format!("  [x] {}", target.label), theme.locked_style()));
    }
    lines.push(Line::default());
    lines.push(Line::styled("Enter: submit", theme.action_style()));
    if let Some(mse) = mse {
        lines.push(Line::default());
        lines.push(Line::styled("MSE Value", theme.header_style()));
        lines.push(Line::styled(format!("  {mse}"), theme.success_style()));
    }
    let paragraph = Paragraph::new(lines)
        .block(pane_block(" Linear Regression ", theme, focused))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// The four report tables in a 2x2 grid, with the overview line in the title
pub fn draw_report(frame: &mut Frame, area: Rect, report: &ReportView, cursor: usize, theme: &Theme, focused: bool) {
    let title = match &report.overview {
        Some(overview) => format!(" Descriptive Report: {overview} "),
        None => " Descriptive Report ".to_string(),
    };
    let outer = pane_block(title, theme, focused);
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let [top, bottom] = Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(inner);
    let [types_area, missing_area] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(top);
    let [unique_area, stats_area] =
        Layout::horizontal([Constraint::Percentage(35), Constraint::Percentage(65)]).areas(bottom);

    let type_rows = report
        .data_types
        .iter()
        .map(|r| Row::new(vec![Cell::from(r.column.clone()), Cell::from(r.dtype.clone())]));
    let types = Table::new(type_rows, [Constraint::Percentage(60), Constraint::Percentage(40)])
        .header(Row::new(vec!["Column", "Type"]).style(theme.header_style()))
        .block(pane_block(" Data Types ", theme, false));
    frame.render_widget(types, types_area);

    let missing_rows = report.missing_values.iter().enumerate().map(|(idx, r)| {
        let action = if r.remove_nulls {
            Cell::from("[remove nulls]").style(theme.action_style())
        } else {
            Cell::from("")
        };
        let row = Row::new(vec![
            Cell::from(r.column.clone()),
            Cell::from(r.dtype.clone().unwrap_or_default()).style(theme.locked_style()),
            Cell::from(r.missing.to_string()),
            action,
        ]);
        if focused && idx == cursor { row.style(theme.cursor_style()) } else { row }
    });
    let missing = Table::new(
        missing_rows,
        [
            Constraint::Percentage(35),
            Constraint::Percentage(20),
            Constraint::Percentage(15),
            Constraint::Percentage(30),
        ],
    )
    .header(Row::new(vec!["Column", "Type", "Missing", ""]).style(theme.header_style()))
    .block(pane_block(" Missing Values ", theme, false).title_bottom(" n: remove nulls "));
    frame.render_widget(missing, missing_area);

    let unique_rows = report.unique_values.iter().map(|r| {
        let (text, height) = match &r.value {
            UniqueCell::Scalar(v) => (Text::from(v.clone()), 1),
            UniqueCell::List(values) => (
                Text::from(
                    values
                        .iter()
                        .enumerate()
                        .map(|(i, v)| Line::from(format!("{}. {v}", i + 1)))
                        .collect::<Vec<_>>(),
                ),
                list_height(values.len()),
            ),
        };
        Row::new(vec![Cell::from(r.column.clone()), Cell::from(text)]).height(height)
    });
    let unique = Table::new(unique_rows, [Constraint::Percentage(45), Constraint::Percentage(55)])
        .header(Row::new(vec!["Column", "Unique Values"]).style(theme.header_style()))
        .block(pane_block(" Unique Values ", theme, false));
    frame.render_widget(unique, unique_area);

    let stats = &report.statistics;
    let mut headers = vec![String::new()];
    headers.extend(stats.columns.iter().cloned());
    let body: Vec<Vec<String>> = stats
        .rows
        .iter()
        .map(|r| std::iter::once(r.statistic.clone()).chain(r.values.iter().cloned()).collect())
        .collect();
    let widths = widths_for(&headers, &body);
    let stat_rows = body.into_iter().map(|cells| {
        let mut cells = cells.into_iter();
        let name = Cell::from(cells.next().unwrap_or_default()).style(theme.header_style());
        Row::new(std::iter::once(name).chain(cells.map(Cell::from)))
    });
    let statistics = Table::new(stat_rows, widths)
        .header(Row::new(headers).style(theme.header_style()))
        .block(pane_block(" Summary Statistics ", theme, false));
    frame.render_widget(statistics, stats_area);
}

pub fn status_paragraph<'a>(status: Option<&StatusLine>, pending: usize, theme: &Theme) -> Paragraph<'a> {
    let mut spans = Vec::new();
    if pending > 0 {
        spans.push(Span::styled(format!("[{pending} pending] "), theme.warning_style()));
    }
    if let Some(status) = status {
        let style = match status.level {
            StatusLevel::Info => theme.success_style(),
            StatusLevel::Warn => theme.warning_style(),
            StatusLevel::Error => theme.error_style(),
        };
        spans.push(Span::styled(status.at.format("%H:%M:%S ").to_string(), theme.locked_style()));
        spans.push(Span::styled(status.message.clone(), style));
    } else {
        spans.push(Span::styled("Press u to upload a dataset, ? for help", theme.locked_style()));
    }
    Paragraph::new(Line::from(spans))
}

/// Keybinding reference grouped by category
pub fn draw_help(frame: &mut Frame, area: Rect, keybindings: &KeyBindings, theme: &Theme) {
    let popup = centered_rect(60, 70, area);
    let mut lines = Vec::new();
    for category in [
        ActionCategory::Dataset,
        ActionCategory::Analysis,
        ActionCategory::Navigation,
        ActionCategory::Application,
    ] {
        lines.push(Line::styled(category.to_string(), theme.header_style()));
        for action in Action::all().into_iter().filter(|a| a.category() == category) {
            let keys = keybindings.keys_for_action(action).join(", ");
            lines.push(Line::from(vec![
                Span::styled(format!("  {keys:<14}"), theme.action_style()),
                Span::raw(action.description()),
            ]));
        }
        lines.push(Line::default());
    }
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).block(pane_block(" Help ", theme, true)),
        popup,
    );
}

/// Rectangle of the given percentage size centred in `area`
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);
    center
}
