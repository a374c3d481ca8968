use std::sync::OnceLock;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};

use crate::app::{App, Popup};
use crate::assets::{self, FeatureChart};
use crate::estimator::ModelFamily;
use crate::form::{FieldId, FormTab};
use crate::gateway::PredictionOutcome;
use crate::theme::Theme;

// Set once at startup from the config; defaults otherwise
static THEME: OnceLock<Theme> = OnceLock::new();

pub fn init_theme(theme: Theme) {
    if THEME.set(theme).is_err() {
        tracing::debug!("Theme already initialised");
    }
}

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

// Helper functions to get theme colors
fn accent() -> Color { theme().accent }
fn inactive() -> Color { theme().inactive }
fn success() -> Color { theme().success }
fn warning() -> Color { theme().warning }
fn danger() -> Color { theme().danger }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn bg_selected() -> Color { theme().bg_selected }
fn header() -> Color { theme().header }

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(1),  // Info line
            Constraint::Length(2),  // Title
            Constraint::Length(3),  // Tabs
            Constraint::Min(6),     // Fields of the active tab
            Constraint::Length(5),  // Prediction
            Constraint::Length(1),  // Footer
        ])
        .split(area);

    draw_info_line(f, app, chunks[0]);
    draw_title(f, chunks[1]);
    draw_tabs(f, app, chunks[2]);
    draw_fields(f, app, chunks[3]);
    draw_prediction(f, app, chunks[4]);
    draw_footer(f, app, chunks[5]);

    // Draw popups on top
    match app.popup {
        Popup::None => {}
        Popup::Review => draw_review_popup(f, app),
        Popup::About => draw_about_popup(f),
        Popup::Insights => draw_insights_popup(f, app),
        Popup::Help => draw_help_popup(f),
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    // Priority: busy > status message > estimator backend
    let line = if app.busy {
        Line::from(Span::styled("󰔟 Calculating your insurance cost...", Style::default().fg(accent())))
    } else if let Some(ref status) = app.status_message {
        Line::from(Span::styled(status, Style::default().fg(warning())))
    } else {
        Line::from(vec![
            Span::styled("Estimator: ", Style::default().fg(text_dim())),
            Span::styled(app.estimator_label(), Style::default().fg(text_dim())),
        ])
    };

    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_title(f: &mut Frame, area: Rect) {
    let title = Paragraph::new(vec![
        Line::from(Span::styled(
            "Health Insurance Cost Predictor",
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Premium estimates from pre-trained regression models",
            Style::default().fg(text_dim()),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(title, area);
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = FormTab::ALL
        .iter()
        .map(|tab| Line::from(format!(" {} ", tab.title())))
        .collect();
    let selected = FormTab::ALL.iter().position(|t| *t == app.tab).unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(text_dim()))
        .highlight_style(Style::default().fg(accent()).add_modifier(Modifier::BOLD))
        .divider(Span::styled("│", Style::default().fg(inactive())))
        .block(
            Block::default()
                .title(Span::styled(" Enter Your Information ", Style::default().fg(header())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(inactive())),
        );
    f.render_widget(tabs, area);
}

/// Value cell text: typed digits while editing, otherwise the current value
fn value_text(app: &App, field: FieldId, focused: bool) -> String {
    if focused {
        if let Some(ref buffer) = app.input_buffer {
            return format!("{}_", buffer);
        }
    }

    let value = app.form.value_text(field);
    let value = if value.is_empty() { "(none)".to_string() } else { value };
    if focused {
        format!("‹ {} ›", value)
    } else {
        format!("  {}", value)
    }
}

fn domain_text(field: FieldId) -> String {
    match field.range() {
        Some(range) => format!("{}-{}", range.min, range.max),
        None => format!("{} options", field.options().len()),
    }
}

fn draw_fields(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(format!(" {} ", app.tab.title()), Style::default().fg(accent()).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));

    let header_row = Row::new(vec![
        Span::styled("Field", Style::default().fg(header())),
        Span::styled("Value", Style::default().fg(header())),
        Span::styled("Range", Style::default().fg(header())),
    ]);

    let focused_field = app.focused_field();
    let rows: Vec<Row> = app
        .tab
        .fields()
        .iter()
        .map(|&field| {
            let focused = field == focused_field;
            let value_color = if focused && app.is_editing() { accent() } else { text() };
            let row_style = if focused {
                Style::default().bg(bg_selected()).fg(text())
            } else {
                Style::default()
            };

            Row::new(vec![
                Span::styled(field.label(), Style::default().fg(text_dim())),
                Span::styled(value_text(app, field, focused), Style::default().fg(value_color)),
                Span::styled(domain_text(field), Style::default().fg(inactive())),
            ])
            .style(row_style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(35),
        Constraint::Percentage(45),
        Constraint::Percentage(20),
    ];

    let table = Table::new(rows, widths)
        .header(header_row)
        .block(block);
    f.render_widget(table, area);
}

fn draw_prediction(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(" Get Your Prediction ", Style::default().fg(header())))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()));

    let lines = if app.busy {
        vec![Line::from(Span::styled(
            "Calculating your insurance cost...",
            Style::default().fg(accent()),
        ))]
    } else {
        match &app.outcome {
            Some(outcome @ PredictionOutcome::Estimated { .. }) => {
                let mut lines = vec![Line::from(Span::styled(
                    outcome.message(),
                    Style::default().fg(success()).add_modifier(Modifier::BOLD),
                ))];
                if let Some(note) = outcome.model_note() {
                    lines.push(Line::from(Span::styled(note, Style::default().fg(text_dim()))));
                }
                lines
            }
            Some(outcome @ PredictionOutcome::Failed(_)) => vec![Line::from(Span::styled(
                outcome.message(),
                Style::default().fg(danger()),
            ))],
            None => vec![Line::from(vec![
                Span::styled("Press ", Style::default().fg(text_dim())),
                Span::styled("Enter", Style::default().fg(accent())),
                Span::styled(" to predict insurance cost", Style::default().fg(text_dim())),
            ])],
        }
    };

    let content = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(block);
    f.render_widget(content, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let hints: Vec<(&str, &str)> = if app.is_editing() {
        vec![
            ("0-9", "Type"),
            ("Enter", "Apply"),
            ("Esc", "Cancel"),
        ]
    } else {
        vec![
            ("Tab", "Next tab"),
            ("↑↓", "Field"),
            ("←→", "Change"),
            ("Enter", "Predict"),
            ("v", "Review"),
            ("i", "Insights"),
            ("a", "About"),
            ("h", "Help"),
        ]
    };

    // Responsive: show fewer hints on narrow terminals
    let max_hints = if area.width < 60 { 4 } else if area.width < 90 { 6 } else { hints.len() };

    let hint_spans: Vec<Span> = hints
        .iter()
        .take(max_hints)
        .flat_map(|(key, action)| {
            vec![
                Span::styled(*key, Style::default().fg(accent())),
                Span::styled(format!(" {} │ ", action), Style::default().fg(text_dim())),
            ]
        })
        .collect();

    let footer = Paragraph::new(Line::from(hint_spans)).alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn popup_block(title: &str) -> Block<'_> {
    Block::default()
        .title(Span::styled(title, Style::default().fg(accent())))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()))
}

fn section_heading(title: &str) -> Line<'_> {
    Line::from(Span::styled(title, Style::default().fg(header()).add_modifier(Modifier::BOLD)))
}

fn bullet(label: &str, value: String) -> Line<'_> {
    Line::from(vec![
        Span::styled(format!("  • {}: ", label), Style::default().fg(text_dim())),
        Span::styled(value, Style::default().fg(text())),
    ])
}

fn draw_review_popup(f: &mut Frame, app: &App) {
    let area = f.area();
    let popup_area = centered_rect(if area.width < 100 { 95 } else { 80 }, 60, area);
    f.render_widget(Clear, popup_area);
    f.render_widget(popup_block(" Review Your Information "), popup_area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .margin(1)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(popup_area);

    let form = &app.form;
    let record = form.record();

    let personal = vec![
        section_heading("Personal Info"),
        bullet("Age", record.age.to_string()),
        bullet("Gender", form.value_text(FieldId::Gender)),
        bullet("Marital Status", form.value_text(FieldId::MaritalStatus)),
        bullet("Employment", form.value_text(FieldId::EmploymentStatus)),
    ];
    let health = vec![
        section_heading("Health & Risk"),
        bullet("BMI Category", form.value_text(FieldId::BmiCategory)),
        bullet("Smoking", form.value_text(FieldId::SmokingStatus)),
        bullet("Genetical Risk", record.genetical_risk.to_string()),
        bullet("Medical History", form.value_text(FieldId::MedicalHistory)),
    ];
    let financial = vec![
        section_heading("Financial & Insurance"),
        bullet("Income", format!("₹{} Lakhs", record.income_lakhs)),
        bullet("Dependants", record.number_of_dependants.to_string()),
        bullet("Insurance Plan", form.value_text(FieldId::InsurancePlan)),
        bullet("Region", form.value_text(FieldId::Region)),
    ];

    for (lines, column) in [personal, health, financial].into_iter().zip(columns.iter()) {
        f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), *column);
    }
}

fn draw_about_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(if area.width < 100 { 95 } else { 70 }, 70, area);
    f.render_widget(Clear, popup_area);

    let mut lines = vec![
        Line::from("Insurance premium costs are predicted from your details by trained"),
        Line::from("machine learning models. Each age group has its own model:"),
        Line::from(""),
    ];
    for family in [ModelFamily::Rest, ModelFamily::Young] {
        lines.push(section_heading(family.age_group()));
        lines.push(Line::from(vec![
            Span::styled("  Model: ", Style::default().fg(text_dim())),
            Span::styled(family.model_name(), Style::default().fg(accent())),
        ]));
        lines.push(Line::from(""));
    }
    lines.push(section_heading("Features Considered"));
    lines.push(Line::from(
        "  Age, Income, Number of Dependants, Insurance Plan Type, Risk Score, BMI Category, \
         Smoking Status, Employment Status, Region, Gender, and Medical History",
    ));

    let about = Paragraph::new(lines)
        .style(Style::default().fg(text()))
        .block(popup_block(" How This App Works "))
        .wrap(Wrap { trim: false });
    f.render_widget(about, popup_area);
}

fn chart_lines(chart: &FeatureChart, selected: bool) -> Vec<Line<'static>> {
    let caption_style = if chart.is_available() {
        Style::default().fg(success())
    } else {
        Style::default().fg(warning())
    };
    let icon = if chart.is_available() { "󰋩 " } else { "󰀦 " };

    let mut lines = vec![
        Line::from(Span::styled(
            chart.title(),
            Style::default().fg(if selected { accent() } else { header() }).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(icon, caption_style),
            Span::styled(chart.caption(), caption_style),
        ]),
        Line::from(""),
        Line::from(Span::styled("Key Insights", Style::default().fg(header()))),
    ];
    lines.extend(
        assets::key_insights(chart.family)
            .iter()
            .map(|insight| Line::from(Span::styled(format!("  • {}", insight), Style::default().fg(text())))),
    );
    lines
}

fn draw_insights_popup(f: &mut Frame, app: &App) {
    let area = f.area();
    let popup_area = centered_rect(if area.width < 100 { 95 } else { 80 }, 70, area);
    f.render_widget(Clear, popup_area);
    f.render_widget(popup_block(" Model Feature Importance "), popup_area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(6), Constraint::Length(1)])
        .split(popup_area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);

    for (i, chart) in app.charts.iter().enumerate() {
        let selected = i == app.selected_chart;
        let border = if selected { accent() } else { inactive() };
        let panel = Paragraph::new(chart_lines(chart, selected))
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(border)));
        f.render_widget(panel, columns[i]);
    }

    let hint = Paragraph::new(Line::from(vec![
        Span::styled("←→", Style::default().fg(accent())),
        Span::raw(" select │ "),
        Span::styled("o", Style::default().fg(accent())),
        Span::raw(" open chart │ "),
        Span::styled("Esc", Style::default().fg(accent())),
        Span::raw(" close"),
    ]))
    .alignment(Alignment::Center)
    .style(Style::default().fg(text_dim()));
    f.render_widget(hint, rows[1]);
}

fn draw_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 60 },
        if area.height < 40 { 95 } else { 70 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let key = |k: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", k), Style::default().fg(accent())),
            Span::raw(what),
        ])
    };

    let help_text = vec![
        section_heading("═══ Navigation ═══"),
        key("Tab", "Next tab (Personal → Financial → Health → Location)"),
        key("↑/↓ j/k", "Move between fields"),
        Line::from(""),
        section_heading("═══ Editing ═══"),
        key("←/→", "Change value (numbers step by 1, options cycle)"),
        key("Space", "Next option"),
        key("0-9", "Type a number, Enter to apply, Esc to cancel"),
        key("r", "Reset all fields to defaults"),
        Line::from(""),
        section_heading("═══ Prediction ═══"),
        key("Enter/p", "Predict insurance cost"),
        key("v", "Review your information"),
        key("i", "Model feature importance"),
        key("a", "How this app works"),
        Line::from(""),
        section_heading("═══ Quick Start ═══"),
        key("premia", "Launch this TUI"),
        key("premia --estimate record.json", ""),
        Line::from(vec![Span::raw("            Print one estimate and exit")]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(text_dim())),
            Span::styled("h", Style::default().fg(accent())),
            Span::styled("/", Style::default().fg(text_dim())),
            Span::styled("?", Style::default().fg(accent())),
            Span::styled("/", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" to close, ", Style::default().fg(text_dim())),
            Span::styled("q", Style::default().fg(accent())),
            Span::styled(" to quit", Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(popup_block(" 󰋖 premia Help "))
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, AssetsConfig};
    use crate::estimator::{Estimator, EstimatorError};
    use crate::form::InputRecord;
    use crate::gateway::PredictionGateway;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    struct Fixed(f64);

    impl Estimator for Fixed {
        fn predict(&self, _record: &InputRecord) -> Result<f64, EstimatorError> {
            Ok(self.0)
        }

        fn describe(&self) -> String {
            "fixed".to_string()
        }
    }

    fn test_app(assets_dir: &std::path::Path) -> App {
        let config = AppConfig {
            assets: AssetsConfig {
                dir: assets_dir.to_path_buf(),
                ..AssetsConfig::default()
            },
            ..AppConfig::default()
        };
        App::new(&config, PredictionGateway::new(Arc::new(Fixed(12345.67))))
    }

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(220, 60)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer();

        // One screen row per line
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_missing_charts_render_fallback_warning() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.popup = Popup::Insights;

        let screen = render(&app);
        assert!(screen.contains("Feature importance chart for Age > 25 will be displayed here when available"));
        assert!(screen.contains("Top drivers: Insurance plan, Genetic risk, and Risk score."));
    }

    #[tokio::test]
    async fn test_prediction_renders_formatted_cost() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.form.set_number(FieldId::Age, 30).unwrap();
        app.request_prediction();

        let screen = render(&app);
        assert!(screen.contains("Calculating your insurance cost..."));

        app.run_prediction().await;
        let screen = render(&app);
        assert!(screen.contains("Predicted Health Insurance Cost: ₹12,345.67"));
        assert!(screen.contains("Prediction made using Gradient Boosted Trees"));
    }

    #[test]
    fn test_form_shows_focused_value_and_range() {
        let dir = tempfile::tempdir().unwrap();
        let app = test_app(dir.path());
        let screen = render(&app);
        assert!(screen.contains("‹ 25 ›"));
        assert!(screen.contains("18-100"));
        assert!(screen.contains("Personal Info"));
    }

    #[test]
    fn test_review_lists_income_in_lakhs() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.popup = Popup::Review;
        let screen = render(&app);
        assert!(screen.contains("Income: ₹5 Lakhs"));
        assert!(screen.contains("Medical History: No Disease"));
    }
}
