use std::time::Duration;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};

use tankduel::{ConnectionState, LinkStats, MatchOutcome, Role, Tank};

pub struct DashboardState<'a> {
    pub role: Role,
    pub player: &'a str,
    pub tick: u64,
    pub elapsed: Duration,
    pub local: &'a Tank,
    pub remote: &'a Tank,
    pub local_shells: usize,
    pub ghost_shells: usize,
    pub pickups: usize,
    pub link: LinkStats,
    pub connection: ConnectionState,
    pub since_last_snapshot: Duration,
    pub connection_lost: bool,
    pub outcome: Option<MatchOutcome>,
}

pub fn render(frame: &mut Frame, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(7),
            Constraint::Min(0),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], state);
    render_health(frame, chunks[1], " You ", state.local, Color::Green);
    render_health(frame, chunks[2], " Opponent ", state.remote, Color::Red);
    render_network(frame, chunks[3], state);
    render_help(frame, chunks[4], state);
}

fn render_header(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let title = format!(
        " Tank Duel - {} as {} - {} ",
        state.player,
        state.role.as_str(),
        format_duration(state.elapsed.as_secs())
    );

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let text = format!(
        "Tick: {}  |  Ammo: {}  |  Shells: {} own / {} opponent  |  Pickups: {}",
        state.tick, state.local.ammo, state.local_shells, state.ghost_shells, state.pickups
    );

    let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(paragraph, area);
}

fn render_health(frame: &mut Frame, area: Rect, title: &str, tank: &Tank, color: Color) {
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));

    let ratio = tank.health as f64 / tankduel::sim::MAX_HEALTH as f64;
    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(health_color(ratio)))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(format!("{} HP", tank.health));

    frame.render_widget(gauge, area);
}

fn render_network(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let block = Block::default()
        .title(" Network ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let link = &state.link;
    let lines = vec![
        Line::from(vec![
            Span::styled("Link: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{:?}", state.connection),
                Style::default().fg(match state.connection {
                    ConnectionState::Connected => Color::Green,
                    ConnectionState::Waiting => Color::Yellow,
                    ConnectionState::Closed => Color::Red,
                }),
            ),
        ]),
        Line::from(vec![
            Span::styled("Messages: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{} sent / {} recv", link.messages_sent, link.messages_received),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Bytes: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!(
                    "{} sent / {} recv",
                    format_bytes(link.bytes_sent),
                    format_bytes(link.bytes_received)
                ),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Dropped: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!(
                    "{} corrupt / {} evicted / {} failed sends",
                    link.frames_dropped, link.messages_evicted, link.send_failures
                ),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Last snapshot: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{:.1}s ago", state.since_last_snapshot.as_secs_f32()),
                Style::default().fg(if state.connection_lost {
                    Color::Red
                } else {
                    Color::White
                }),
            ),
        ]),
    ];

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}

fn render_help(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let (text, style) = match (state.outcome, state.connection_lost) {
        (Some(MatchOutcome::Won), _) => ("VICTORY - press 'q' to leave", Style::default().fg(Color::Green)),
        (Some(MatchOutcome::Lost), _) => ("DEFEAT - press 'q' to leave", Style::default().fg(Color::Red)),
        (None, true) => (
            "CONNECTION LOST - press 'q' or ESC to quit",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        (None, false) => (
            "Press 'q' or ESC to quit",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ),
    };

    frame.render_widget(Paragraph::new(text).block(block).style(style), area);
}

fn health_color(ratio: f64) -> Color {
    if ratio > 0.5 {
        Color::Green
    } else if ratio > 0.25 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn format_duration(secs: u64) -> String {
    let mins = secs / 60;
    let secs = secs % 60;
    format!("{:02}:{:02}", mins, secs)
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{}B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
