//! Live terminal dashboard, presentation only: the wire contract lives in
//! `genset-io`, this just renders the latest snapshot.

use crossterm::event::{self, Event, KeyCode};
use genset_core::{GeneratorSnapshot, StateExchange, Status};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Row, Table},
    Frame,
};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Refresh cadence; matches the reference four frames per second.
const FRAME_PERIOD: Duration = Duration::from_millis(250);

/// Run the dashboard on the calling thread until `q`/`Esc`, the optional
/// deadline, or an external stop. Sets `stop` on exit so the rest of the
/// process winds down with it.
pub fn run(
    exchange: Arc<StateExchange>,
    stop: Arc<AtomicBool>,
    deadline: Option<Duration>,
) -> io::Result<()> {
    let mut terminal = ratatui::init();
    let started = Instant::now();

    let result = loop {
        if stop.load(Ordering::Relaxed) {
            break Ok(());
        }
        if let Some(limit) = deadline {
            if started.elapsed() >= limit {
                break Ok(());
            }
        }

        let snapshot = exchange.latest();
        if let Err(err) = terminal.draw(|frame| draw(frame, &snapshot)) {
            break Err(err);
        }

        if event::poll(FRAME_PERIOD)? {
            if let Event::Key(key) = event::read()? {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    break Ok(());
                }
            }
        }
    };

    ratatui::restore();
    stop.store(true, Ordering::Relaxed);
    result
}

fn draw(frame: &mut Frame, snapshot: &GeneratorSnapshot) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(8)])
        .split(frame.area());

    frame.render_widget(status_banner(snapshot), rows[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    frame.render_widget(electrical_table(snapshot), columns[0]);
    frame.render_widget(mechanical_table(snapshot), columns[1]);
}

fn status_banner(snapshot: &GeneratorSnapshot) -> Paragraph<'static> {
    let style = match snapshot.status {
        Status::Running => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        Status::Starting => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        Status::EmergencyStop => Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::BOLD | Modifier::RAPID_BLINK),
    };
    Paragraph::new(Line::styled(
        format!("STATUS: {}", snapshot.status),
        style,
    ))
    .block(Block::default().borders(Borders::ALL).title("genset"))
}

fn electrical_table(snapshot: &GeneratorSnapshot) -> Table<'static> {
    let rows = vec![
        Row::new(vec![
            "Voltage L1".to_string(),
            format!("{:.1} V", snapshot.voltage_l1_v),
        ]),
        Row::new(vec![
            "Current L1".to_string(),
            format!("{:.1} A", snapshot.current_l1_a),
        ]),
        Row::new(vec![
            "Power".to_string(),
            format!("{:.2} kW", snapshot.power_kw),
        ]),
    ];
    Table::new(rows, [Constraint::Length(14), Constraint::Min(10)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title("ELECTRICAL OUTPUT"),
    )
}

fn mechanical_table(snapshot: &GeneratorSnapshot) -> Table<'static> {
    let health_color = if snapshot.health_pct > 80.0 {
        Color::Green
    } else if snapshot.health_pct > 50.0 {
        Color::Yellow
    } else {
        Color::Red
    };
    let rows = vec![
        Row::new(vec![
            "RPM".to_string(),
            format!("{}", snapshot.rpm.trunc() as i64),
        ]),
        Row::new(vec![
            "Vibration".to_string(),
            format!("{:.3} g", snapshot.vibration_g),
        ]),
        Row::new(vec![
            "Oil Pressure".to_string(),
            format!("{:.2} bar", snapshot.oil_pressure_bar),
        ]),
        Row::new(vec![
            "Health".to_string(),
            format!("{:.1} %", snapshot.health_pct),
        ])
        .style(Style::default().fg(health_color)),
    ];
    Table::new(rows, [Constraint::Length(14), Constraint::Min(10)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue))
            .title("MECHANICAL / FLUIDS"),
    )
}
