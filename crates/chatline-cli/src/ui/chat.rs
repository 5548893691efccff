use crate::app_state::{AppController, ChatLine, Variant};
use crate::tui::Action;
use chatline_sdk::ViewEvent;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// How long a newly revealed line stays highlighted.
const REVEAL: Duration = Duration::from_millis(1200);
/// Lines kept in the conversation pane.
const SCROLLBACK: usize = 500;

pub struct ChatApp {
    variant: Variant,
    submissions: UnboundedSender<String>,
    should_quit: bool,

    // Connection
    status: String,
    controls_enabled: bool,

    // Input
    input: String,

    // Data
    lines: VecDeque<ChatLine>,

    // Alerts waiting to be dismissed, oldest first
    alerts: VecDeque<String>,
}

impl ChatApp {
    pub fn new(variant: Variant, submissions: UnboundedSender<String>) -> Self {
        Self {
            variant,
            submissions,
            should_quit: false,
            status: "starting".to_string(),
            controls_enabled: false,
            input: String::new(),
            lines: VecDeque::new(),
            alerts: VecDeque::new(),
        }
    }

    fn apply(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::ControlsEnabled(enabled) => self.controls_enabled = enabled,
            ViewEvent::Appended(message) => {
                self.lines.push_back(ChatLine::from(&message));
                while self.lines.len() > SCROLLBACK {
                    self.lines.pop_front();
                }
            }
            ViewEvent::Notified(text) => self.alerts.push_back(text),
            ViewEvent::InputReset { clear } => {
                if clear {
                    self.input.clear();
                }
            }
            ViewEvent::Status(status) => self.status = status,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        // A pending alert swallows input until dismissed.
        if !self.alerts.is_empty() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                self.alerts.pop_front();
            }
            return;
        }

        if key.code == KeyCode::Esc {
            self.should_quit = true;
            return;
        }

        if !self.controls_enabled {
            return;
        }

        match key.code {
            KeyCode::Enter => {
                debug!(len = self.input.len(), "submitting");
                // Re-enabled by the session once the attempt completes.
                self.controls_enabled = false;
                let _ = self.submissions.send(self.input.clone());
            }
            KeyCode::Char(c) => self.input.push(c),
            KeyCode::Backspace => {
                self.input.pop();
            }
            _ => {}
        }
    }

    fn render_messages(&self, f: &mut Frame, area: Rect) {
        let visible = usize::from(area.height.saturating_sub(2));
        let skip = self.lines.len().saturating_sub(visible);

        let items: Vec<ListItem> = self
            .lines
            .iter()
            .skip(skip)
            .map(|line| {
                let body_style = if line.revealed_at.elapsed() < REVEAL {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{} ", line.timestamp), Style::default().fg(Color::DarkGray)),
                    Span::styled(format!("{}: ", line.from), Style::default().fg(Color::Cyan)),
                    Span::styled(line.body.clone(), body_style),
                ]))
            })
            .collect();

        let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Conversation"));
        f.render_widget(list, area);
    }
}

impl AppController for ChatApp {
    fn update(&mut self, action: Action) {
        match action {
            Action::Key(key) => self.on_key(key),
            Action::View(event) => self.apply(event),
            Action::Tick | Action::Resize(_, _) => {}
        }
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(f.area());

        // Top: Status
        let status_color = match self.status.as_str() {
            "open" | "polling" => Color::Green,
            "connecting" | "starting" => Color::Yellow,
            _ => Color::Red,
        };
        let header = Paragraph::new(Line::from(vec![
            Span::raw(format!("{}: ", self.variant)),
            Span::styled(
                self.status.as_str(),
                Style::default().fg(status_color).add_modifier(Modifier::BOLD),
            ),
        ]))
        .block(Block::default().borders(Borders::ALL).title("Chat"));
        f.render_widget(header, chunks[0]);

        // Middle: Conversation
        self.render_messages(f, chunks[1]);

        // Bottom: Input
        let (input_style, title) = if self.controls_enabled {
            (Style::default().fg(Color::White), "Message [Enter] send  [Esc] quit")
        } else {
            (Style::default().fg(Color::DarkGray), "Message (disabled)")
        };
        let input = Paragraph::new(self.input.as_str())
            .style(input_style)
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(input, chunks[2]);

        // Alert Overlay
        if let Some(alert) = self.alerts.front() {
            let area = centered_rect(60, 25, f.area());
            let block = Paragraph::new(alert.as_str())
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("Notification [Enter] dismiss")
                        .style(Style::default().bg(Color::Blue).fg(Color::White)),
                );
            f.render_widget(Clear, area);
            f.render_widget(block, area);
        }
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }
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
