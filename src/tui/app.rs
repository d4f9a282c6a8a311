use crate::config::Config;
use crate::core::{SharedState, ViewMode, lock_state};
use crate::services::{AnalysisController, AnalysisService, ResultRenderer, UploadController, UploadFile};
use crate::tui::widgets;
use crate::tui::{Action, KeyBindings, Theme};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    Frame,
    layout::{Constraint, Layout},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, warn};
use tui_textarea::TextArea;

/// Completion notices from background service calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    Finished(&'static str),
}

/// Pane that receives cursor movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    #[default]
    Columns,
    Preview,
    Report,
}

impl Pane {
    fn next(self) -> Self {
        match self {
            Pane::Columns => Pane::Preview,
            Pane::Preview => Pane::Report,
            Pane::Report => Pane::Columns,
        }
    }

    fn prev(self) -> Self {
        match self {
            Pane::Columns => Pane::Report,
            Pane::Preview => Pane::Columns,
            Pane::Report => Pane::Preview,
        }
    }
}

/// Application state
///
/// Routes keys to actions, starts controller calls on the local task set and
/// draws whatever the shared workflow state holds at the time of the frame.
pub struct App<S> {
    state: SharedState,
    uploads: UploadController<S>,
    analysis: AnalysisController<S>,

    keybindings: KeyBindings,
    theme: Theme,

    focus: Pane,
    column_cursor: usize,
    report_cursor: usize,

    /// File path prompt, open while choosing a file to upload
    path_input: Option<TextArea<'static>>,
    /// Prefill for the path prompt (last submitted path or the CLI argument)
    last_path: Option<PathBuf>,

    show_help: bool,
    should_quit: bool,

    /// Number of service calls still running
    pending: usize,
    events: UnboundedSender<AppEvent>,
}

impl<S: AnalysisService + 'static> App<S> {
    pub fn new(service: Arc<S>, state: SharedState, config: &Config, events: UnboundedSender<AppEvent>) -> Self {
        let keybindings = KeyBindings::from_bindings(config.keybindings.clone());
        for warning in keybindings.validate() {
            warn!("{warning}");
        }
        Self {
            uploads: UploadController::new(Arc::clone(&service), Arc::clone(&state)),
            analysis: AnalysisController::new(service, Arc::clone(&state)),
            state,
            keybindings,
            theme: Theme::by_name(&config.ui.theme),
            focus: Pane::default(),
            column_cursor: 0,
            report_cursor: 0,
            path_input: None,
            last_path: None,
            show_help: false,
            should_quit: false,
            pending: 0,
            events,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn focus(&self) -> Pane {
        self.focus
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn keybindings(&self) -> &KeyBindings {
        &self.keybindings
    }

    /// Open the upload prompt with `path` already filled in
    pub fn prefill_upload(&mut self, path: PathBuf) {
        self.last_path = Some(path);
        self.open_path_input();
    }

    /// Start an upload of `path` without going through the prompt
    pub fn upload_path(&mut self, path: PathBuf) {
        self.last_path = Some(path.clone());
        let uploads = self.uploads.clone();
        let state = Arc::clone(&self.state);
        self.spawn("upload", async move {
            match UploadFile::from_path(&path).await {
                Ok(file) => {
                    let _ = uploads.submit(Some(file)).await;
                }
                Err(e) => {
                    error!(path = %path.display(), "cannot read upload file: {e}");
                    lock_state(&state).report_warning(format!("Cannot read {}: {e}", path.display()));
                }
            }
        });
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Finished(operation) => {
                self.pending = self.pending.saturating_sub(1);
                debug!(operation, pending = self.pending, "service call finished");
            }
        }
    }

    /// Handle a key event
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        // The path prompt takes raw text, so it sees keys before the bindings do
        if let Some(input) = &mut self.path_input {
            match key.code {
                KeyCode::Enter => self.submit_path_input(),
                KeyCode::Esc => self.path_input = None,
                _ => {
                    input.input(key);
                }
            }
            return;
        }

        let Some(action) = self.keybindings.get_action(&key) else {
            return;
        };
        if self.show_help && !matches!(action, Action::Quit) {
            if matches!(action, Action::ToggleHelp | Action::Cancel | Action::Confirm) {
                self.show_help = false;
            }
            return;
        }
        self.handle_action(action);
    }

    fn handle_action(&mut self, action: Action) {
        debug!(?action, "action");
        match action {
            Action::Quit => self.should_quit = true,
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::Cancel => self.show_help = false,
            Action::NextPane => self.focus = self.focus.next(),
            Action::PrevPane => self.focus = self.focus.prev(),
            Action::MoveUp => self.move_cursor(-1),
            Action::MoveDown => self.move_cursor(1),
            Action::Upload => self.open_path_input(),
            Action::ShowPreview => {
                if !self.analysis.load_preview() {
                    lock_state(&self.state).report_warning("Upload a dataset before showing its preview");
                }
            }
            Action::LoadTail => {
                let analysis = self.analysis.clone();
                self.spawn("tail", async move {
                    let _ = analysis.load_tail().await;
                });
            }
            Action::LoadReport => {
                let analysis = self.analysis.clone();
                self.spawn("describe", async move {
                    let _ = analysis.load_descriptive_report().await;
                });
            }
            Action::ToggleColumn => self.toggle_column_at_cursor(),
            Action::PlotPair => self.start_plot(),
            Action::OpenRegressionForm => {
                let _ = self.analysis.request_regression_form();
            }
            Action::FillMissing => self.fill_column_at_cursor(),
            Action::Confirm => {
                let view_mode = lock_state(&self.state).view_mode();
                match (view_mode, self.focus) {
                    (ViewMode::RegressionForm, _) => self.start_regression(),
                    (ViewMode::ColumnPicker, Pane::Columns) => self.start_plot(),
                    (ViewMode::ColumnPicker, Pane::Report) => self.fill_column_at_cursor(),
                    _ => {}
                }
            }
        }
    }

    fn spawn<F>(&mut self, operation: &'static str, task: F)
    where
        F: Future<Output = ()> + 'static,
    {
        self.pending += 1;
        let events = self.events.clone();
        tokio::task::spawn_local(async move {
            task.await;
            let _ = events.send(AppEvent::Finished(operation));
        });
    }

    fn start_plot(&mut self) {
        let analysis = self.analysis.clone();
        self.spawn("plot", async move {
            let _ = analysis.plot_pair().await;
        });
    }

    fn start_regression(&mut self) {
        let analysis = self.analysis.clone();
        self.spawn("train", async move {
            let _ = analysis.run_regression().await;
        });
    }

    fn open_path_input(&mut self) {
        let mut input = match &self.last_path {
            Some(path) => TextArea::new(vec![path.display().to_string()]),
            None => TextArea::default(),
        };
        input.set_cursor_line_style(Default::default());
        input.move_cursor(tui_textarea::CursorMove::End);
        input.set_block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Upload file (Enter: submit, Esc: cancel) ")
                .border_style(self.theme.border_style(true)),
        );
        self.path_input = Some(input);
    }

    fn submit_path_input(&mut self) {
        let Some(input) = self.path_input.take() else {
            return;
        };
        let text = input.lines().join("").trim().to_string();
        if text.is_empty() {
            let uploads = self.uploads.clone();
            self.spawn("upload", async move {
                let _ = uploads.submit(None).await;
            });
            return;
        }
        self.upload_path(PathBuf::from(text));
    }

    fn cursor_len(&self) -> usize {
        let state = lock_state(&self.state);
        match self.focus {
            Pane::Columns if state.column_picker_visible() => state.column_titles().len(),
            Pane::Report => state.report().map_or(0, |r| r.missing_values.len()),
            _ => 0,
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.cursor_len();
        let cursor = match self.focus {
            Pane::Columns => &mut self.column_cursor,
            Pane::Report => &mut self.report_cursor,
            Pane::Preview => return,
        };
        if len == 0 {
            *cursor = 0;
            return;
        }
        *cursor = cursor.saturating_add_signed(delta).min(len - 1);
    }

    fn toggle_column_at_cursor(&mut self) {
        if self.focus != Pane::Columns {
            return;
        }
        let mut state = lock_state(&self.state);
        if !state.column_picker_visible() {
            return;
        }
        let Some(column) = state.column_titles().get(self.column_cursor).cloned() else {
            return;
        };
        state.toggle_column(&column);
    }

    fn fill_column_at_cursor(&mut self) {
        if self.focus != Pane::Report {
            return;
        }
        let column = {
            let mut state = lock_state(&self.state);
            let Some(report) = state.report() else {
                return;
            };
            let Some(column) = report.missing_values.columns().nth(self.report_cursor).map(str::to_string) else {
                return;
            };
            if !report.can_fill_missing(&column) {
                state.report_warning(format!("Remove nulls is not offered for {column}"));
                return;
            }
            column
        };
        let analysis = self.analysis.clone();
        self.spawn("fillna", async move {
            let _ = analysis.fill_missing(&column).await;
        });
    }

    /// Draw one frame from the current workflow state
    pub fn render(&mut self, frame: &mut Frame) {
        let model = {
            let state = lock_state(&self.state);
            ResultRenderer::render(&state)
        };
        let theme = &self.theme;

        let [title_area, body, status_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let dataset = model.dataset.as_deref().unwrap_or("no dataset");
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(" statlens ", theme.header_style().add_modifier(Modifier::BOLD)),
                Span::styled(format!(" {dataset} "), theme.normal_style()),
            ])),
            title_area,
        );

        let [left, right] = Layout::horizontal([Constraint::Percentage(28), Constraint::Percentage(72)]).areas(body);
        let [data_area, report_area] = Layout::vertical([Constraint::Percentage(45), Constraint::Percentage(55)]).areas(right);

        let columns_focused = self.focus == Pane::Columns;
        if let Some(form) = &model.regression_form {
            widgets::draw_regression_form(frame, left, form, model.mse, theme, columns_focused);
        } else if let Some(picker) = &model.column_picker {
            widgets::draw_column_picker(frame, left, picker, self.column_cursor, theme, columns_focused);
        } else {
            frame.render_widget(
                Paragraph::new("Upload a dataset (u) to pick columns")
                    .style(theme.locked_style())
                    .block(
                        Block::default()
                            .title(" Select Columns ")
                            .borders(Borders::ALL)
                            .border_style(theme.border_style(columns_focused)),
                    ),
                left,
            );
        }

        let preview_focused = self.focus == Pane::Preview;
        if model.tail.is_some() && model.preview.is_some() {
            let [head_area, tail_area] =
                Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(data_area);
            widgets::draw_table(frame, head_area, " Preview ", model.preview.as_ref(), theme, preview_focused);
            widgets::draw_table(frame, tail_area, " Tail ", model.tail.as_ref(), theme, preview_focused);
        } else if model.tail.is_some() {
            widgets::draw_table(frame, data_area, " Tail ", model.tail.as_ref(), theme, preview_focused);
        } else {
            widgets::draw_table(frame, data_area, " Preview ", model.preview.as_ref(), theme, preview_focused);
        }

        let report_focused = self.focus == Pane::Report;
        match &model.report {
            Some(report) => widgets::draw_report(frame, report_area, report, self.report_cursor, theme, report_focused),
            None => frame.render_widget(
                Paragraph::new("Press i to load the descriptive report")
                    .style(theme.locked_style())
                    .block(
                        Block::default()
                            .title(" Descriptive Report ")
                            .borders(Borders::ALL)
                            .border_style(theme.border_style(report_focused)),
                    ),
                report_area,
            ),
        }

        frame.render_widget(
            widgets::status_paragraph(model.status.as_ref(), self.pending, theme),
            status_area,
        );

        if let Some(input) = &self.path_input {
            let area = widgets::centered_rect(60, 20, frame.area());
            let [prompt] = Layout::vertical([Constraint::Length(3)]).areas(area);
            frame.render_widget(Clear, prompt);
            frame.render_widget(input, prompt);
        }
        if self.show_help {
            widgets::draw_help(frame, frame.area(), &self.keybindings, theme);
        }
    }
}
