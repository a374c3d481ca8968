use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use std::time::Instant;

use crate::assets::{self, FeatureChart};
use crate::config::AppConfig;
use crate::form::{FieldId, FormState, FormTab};
use crate::gateway::{PredictionGateway, PredictionOutcome};

/// How long a status message stays in the info line
const STATUS_SECONDS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Review,   // Summary of the current values
    About,    // How the two models are used
    Insights, // Feature importance charts and key insights
    Help,
}

pub struct App {
    pub form: FormState,
    pub tab: FormTab,
    pub selected_field: usize,
    pub popup: Popup,

    // Typed digits for the focused numeric field, committed on Enter
    pub input_buffer: Option<String>,

    // Prediction state
    pub outcome: Option<PredictionOutcome>,
    pub busy: bool,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,

    // Feature importance charts (Age > 25 first)
    pub charts: [FeatureChart; 2],
    pub selected_chart: usize,
    viewer: String,

    gateway: PredictionGateway,
}

impl App {
    pub fn new(config: &AppConfig, gateway: PredictionGateway) -> Self {
        let charts = assets::locate_charts(&config.assets);
        for chart in &charts {
            if !chart.is_available() {
                tracing::info!("{}", chart.caption());
            }
        }

        Self {
            form: FormState::new(),
            tab: FormTab::Personal,
            selected_field: 0,
            popup: Popup::None,
            input_buffer: None,
            outcome: None,
            busy: false,
            status_message: None,
            status_message_time: None,
            charts,
            selected_chart: 0,
            viewer: config.assets.viewer.clone(),
            gateway,
        }
    }

    /// Backend description for the info line
    pub fn estimator_label(&self) -> String {
        self.gateway.describe()
    }

    /// Set a status message (auto-clears after a few seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    pub fn focused_field(&self) -> FieldId {
        let fields = self.tab.fields();
        fields[self.selected_field.min(fields.len() - 1)]
    }

    /// True while typed digits are pending for the focused field
    pub fn is_editing(&self) -> bool {
        self.input_buffer.is_some()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.busy {
            // Input is ignored until the estimator returns
            return Ok(());
        }

        if self.popup != Popup::None {
            return self.handle_popup_key(key);
        }

        if self.is_editing() {
            return self.handle_edit_key(key);
        }

        self.handle_normal_key(key)
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            // Navigation between tabs
            KeyCode::Tab => self.switch_tab(self.tab.next()),
            KeyCode::BackTab => self.switch_tab(self.tab.prev()),

            // Field navigation
            KeyCode::Char('j') | KeyCode::Down => {
                let count = self.tab.fields().len();
                self.selected_field = (self.selected_field + 1) % count;
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let count = self.tab.fields().len();
                self.selected_field = (self.selected_field + count - 1) % count;
            }

            // Change the focused value
            KeyCode::Left => self.form.step(self.focused_field(), -1),
            KeyCode::Right | KeyCode::Char(' ') => self.form.step(self.focused_field(), 1),
            KeyCode::Char(c) if c.is_ascii_digit() && self.focused_field().is_numeric() => {
                self.input_buffer = Some(c.to_string());
            }

            // Submit
            KeyCode::Enter | KeyCode::Char('p') => self.request_prediction(),

            // Reset every field to its default
            KeyCode::Char('r') => {
                self.form = FormState::new();
                self.outcome = None;
                self.set_status("Form reset to defaults");
            }

            KeyCode::Char('v') => self.popup = Popup::Review,
            KeyCode::Char('a') => self.popup = Popup::About,
            KeyCode::Char('i') => self.popup = Popup::Insights,
            KeyCode::Char('?') | KeyCode::Char('h') => self.popup = Popup::Help,

            _ => {}
        }
        Ok(())
    }

    fn handle_edit_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(buffer) = self.input_buffer.as_mut() else {
            return Ok(());
        };

        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                // Longest range bound is three digits
                if buffer.len() < 3 {
                    buffer.push(c);
                }
            }
            KeyCode::Backspace => {
                buffer.pop();
                if buffer.is_empty() {
                    self.input_buffer = None;
                }
            }
            KeyCode::Esc => self.input_buffer = None,
            KeyCode::Enter => self.commit_edit(),
            // Commit, then move as usual
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.commit_edit();
                return self.handle_normal_key(key);
            }
            _ => {}
        }
        Ok(())
    }

    /// Apply typed digits; out-of-range input is rejected and the old value kept
    fn commit_edit(&mut self) {
        let Some(buffer) = self.input_buffer.take() else {
            return;
        };
        let field = self.focused_field();

        match self.form.set_from_text(field, &buffer) {
            Ok(()) => self.set_status(format!("{} set to {}", field.label(), buffer)),
            Err(e) => self.set_status(e.to_string()),
        }
    }

    fn handle_popup_key(&mut self, key: KeyEvent) -> Result<()> {
        match (self.popup, key.code) {
            (_, KeyCode::Esc | KeyCode::Char('q')) => self.popup = Popup::None,
            (Popup::Insights, KeyCode::Left | KeyCode::Right | KeyCode::Tab) => {
                self.selected_chart = 1 - self.selected_chart;
            }
            (Popup::Insights, KeyCode::Char('o')) => {
                let chart = &self.charts[self.selected_chart];
                let message = match assets::open_chart(chart, &self.viewer) {
                    Ok(()) => format!("Opened {}", chart.path().display()),
                    Err(e) => e.to_string(),
                };
                self.set_status(message);
            }
            (Popup::Help, KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Enter) => self.popup = Popup::None,
            (Popup::Review | Popup::About, KeyCode::Enter | KeyCode::Char('v') | KeyCode::Char('a')) => {
                self.popup = Popup::None;
            }
            _ => {}
        }
        Ok(())
    }

    fn switch_tab(&mut self, tab: FormTab) {
        self.tab = tab;
        self.selected_field = 0;
    }

    /// Mark a submission; the event loop draws the busy state, then calls `run_prediction`
    pub fn request_prediction(&mut self) {
        self.busy = true;
    }

    /// Send the current record to the estimator and keep the outcome
    pub async fn run_prediction(&mut self) {
        let record = self.form.record();
        tracing::info!("Submitting record for age {}", record.age);

        let outcome = self.gateway.submit(record).await;
        self.outcome = Some(outcome);
        self.busy = false;
    }

    pub fn tick(&mut self) {
        // Clear status message after a few seconds
        if let Some(time) = self.status_message_time {
            if time.elapsed().as_secs() >= STATUS_SECONDS {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssetsConfig;
    use crate::estimator::{Estimator, EstimatorError};
    use crate::form::{Gender, InputRecord};
    use crossterm::event::KeyModifiers;
    use std::sync::{Arc, Mutex};

    /// Remembers the last record it was given
    struct Recording {
        seen: Mutex<Option<InputRecord>>,
        result: Result<f64, &'static str>,
    }

    impl Estimator for Recording {
        fn predict(&self, record: &InputRecord) -> Result<f64, EstimatorError> {
            *self.seen.lock().unwrap() = Some(record.clone());
            self.result.map_err(|e| EstimatorError::Failed(e.to_string()))
        }

        fn describe(&self) -> String {
            "recording".to_string()
        }
    }

    fn app_with(result: Result<f64, &'static str>) -> (App, Arc<Recording>) {
        let estimator = Arc::new(Recording { seen: Mutex::new(None), result });
        let config = AppConfig {
            assets: AssetsConfig {
                dir: std::path::PathBuf::from("/nonexistent"),
                ..AssetsConfig::default()
            },
            ..AppConfig::default()
        };
        let app = App::new(&config, PredictionGateway::new(estimator.clone()));
        (app, estimator)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE)).unwrap();
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[tokio::test]
    async fn test_submit_sends_form_values() {
        let (mut app, estimator) = app_with(Ok(12345.67));

        type_text(&mut app, "30");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.form.record().age, 30);
        assert!(!app.busy, "committing an edit should not submit");

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Char('p'));
        assert!(app.busy);

        app.run_prediction().await;
        assert!(!app.busy);

        let seen = estimator.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.age, 30);
        assert_eq!(seen.gender, Gender::Female);

        let outcome = app.outcome.as_ref().unwrap();
        assert_eq!(outcome.message(), "Predicted Health Insurance Cost: ₹12,345.67");
    }

    #[tokio::test]
    async fn test_failure_is_shown_and_app_keeps_running() {
        let (mut app, _) = app_with(Err("model file not found"));

        press(&mut app, KeyCode::Enter);
        app.run_prediction().await;
        assert!(app.outcome.as_ref().unwrap().message().contains("model file not found"));

        // Next submission is accepted as usual
        press(&mut app, KeyCode::Enter);
        assert!(app.busy);
    }

    #[test]
    fn test_out_of_range_entry_is_rejected() {
        let (mut app, _) = app_with(Ok(1.0));

        type_text(&mut app, "17");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.form.record().age, 25);
        assert!(app.status_message.as_deref().unwrap().contains("between 18 and 100"));

        type_text(&mut app, "1012");
        assert_eq!(app.input_buffer.as_deref(), Some("101"));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.form.record().age, 25);

        type_text(&mut app, "100");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.form.record().age, 100);
    }

    #[test]
    fn test_navigation_keys_commit_and_move() {
        let (mut app, _) = app_with(Ok(1.0));

        type_text(&mut app, "40");
        press(&mut app, KeyCode::Down);
        assert_eq!(app.form.record().age, 40);
        assert_eq!(app.focused_field(), FieldId::Gender);
        assert!(!app.is_editing());

        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "12");
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.form.record().income_lakhs, 12);
        assert_eq!(app.tab, FormTab::Health);
        assert!(!app.busy);
    }

    #[test]
    fn test_escape_discards_typed_digits() {
        let (mut app, _) = app_with(Ok(1.0));
        type_text(&mut app, "4");
        press(&mut app, KeyCode::Esc);
        assert!(!app.is_editing());
        assert_eq!(app.form.record().age, 25);
    }

    #[test]
    fn test_digits_ignored_on_select_fields() {
        let (mut app, _) = app_with(Ok(1.0));
        press(&mut app, KeyCode::Down);
        assert_eq!(app.focused_field(), FieldId::Gender);
        type_text(&mut app, "5");
        assert!(!app.is_editing());
    }

    #[test]
    fn test_tabs_cycle_and_reset_focus() {
        let (mut app, _) = app_with(Ok(1.0));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.tab, FormTab::Financial);
        assert_eq!(app.focused_field(), FieldId::IncomeLakhs);

        press(&mut app, KeyCode::BackTab);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.tab, FormTab::Location);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.focused_field(), FieldId::InsurancePlan);
    }

    #[test]
    fn test_popups_open_and_close() {
        let (mut app, _) = app_with(Ok(1.0));
        press(&mut app, KeyCode::Char('i'));
        assert_eq!(app.popup, Popup::Insights);

        press(&mut app, KeyCode::Right);
        assert_eq!(app.selected_chart, 1);

        // Charts are missing, so opening one reports the fallback text
        press(&mut app, KeyCode::Char('o'));
        assert!(app.status_message.as_deref().unwrap().contains("Age ≤ 25"));

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.popup, Popup::None);

        press(&mut app, KeyCode::Char('v'));
        assert_eq!(app.popup, Popup::Review);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.popup, Popup::None);
    }

    #[test]
    fn test_busy_ignores_keys() {
        let (mut app, _) = app_with(Ok(1.0));
        app.request_prediction();
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.tab, FormTab::Personal);
    }
}
