use chronoclash::{
    display::NONE_TEXT,
    protocol::{
        CardSlot,
        MoveType,
    },
    view::{
        AppSnapshot,
        Inputs,
        LeaderboardPanel,
        Notification,
        NotificationKind,
        View,
        ViewState,
    },
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use crossterm::{
    event::{
        Event,
        EventStream,
        KeyCode,
        KeyEvent,
        KeyEventKind,
        KeyModifiers,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use futures::StreamExt;
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::io::stdout;
use unicode_width::UnicodeWidthStr;

const HISTORY_LINES: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserEvent {
    Quit,
    Redraw,
    ConnectWallet,
    DisconnectWallet,
    CreateMatch,
    JoinMatch,
    PlayTurn,
    RefreshState,
    RefreshLeaderboard,
}

pub type InputEvents = EventStream;

#[derive(Debug, Default)]
pub struct UiState {
    mode: Mode,
    view: View,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Mode {
    #[default]
    Normal,
    WagerModal,
    RoomCodeModal,
    TurnModal(TurnField),
    QuitModal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TurnField {
    Card,
    MoveType,
    Target,
    RoomCode,
}

impl TurnField {
    const ALL: [TurnField; 4] = [
        TurnField::Card,
        TurnField::MoveType,
        TurnField::Target,
        TurnField::RoomCode,
    ];

    fn next(self) -> Self {
        match self {
            TurnField::Card => TurnField::MoveType,
            TurnField::MoveType => TurnField::Target,
            TurnField::Target => TurnField::RoomCode,
            TurnField::RoomCode => TurnField::Card,
        }
    }

    fn label(self) -> &'static str {
        match self {
            TurnField::Card => "Card (1-4)",
            TurnField::MoveType => "Move",
            TurnField::Target => "Target (1-4)",
            TurnField::RoomCode => "Room code",
        }
    }

    fn value(self, inputs: &Inputs) -> &str {
        match self {
            TurnField::Card => &inputs.card,
            TurnField::MoveType => &inputs.move_type,
            TurnField::Target => &inputs.target,
            TurnField::RoomCode => &inputs.room_code,
        }
    }

    fn value_mut(self, inputs: &mut Inputs) -> &mut String {
        match self {
            TurnField::Card => &mut inputs.card,
            TurnField::MoveType => &mut inputs.move_type,
            TurnField::Target => &mut inputs.target,
            TurnField::RoomCode => &mut inputs.room_code,
        }
    }

    /// Options Left/Right step through; the room code is free text.
    fn presets(self) -> Vec<String> {
        match self {
            TurnField::Card | TurnField::Target => {
                CardSlot::ALL.iter().map(|slot| slot.to_string()).collect()
            }
            TurnField::MoveType => {
                MoveType::ALL.iter().map(|m| m.as_str().to_owned()).collect()
            }
            TurnField::RoomCode => Vec::new(),
        }
    }
}

/// Moves `value` one preset forward or back. Free text snaps to either end.
fn cycle_preset(value: &mut String, presets: &[String], forward: bool) {
    if presets.is_empty() {
        return;
    }
    let len = presets.len();
    let next = match presets.iter().position(|p| p == value) {
        Some(idx) if forward => (idx + 1) % len,
        Some(idx) => (idx + len - 1) % len,
        None if forward => 0,
        None => len - 1,
    };
    *value = presets[next].clone();
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}

pub fn input_event_stream() -> InputEvents {
    EventStream::new()
}

pub async fn next_raw_event(events: &mut InputEvents) -> Result<Event> {
    match events.next().await {
        Some(event) => Ok(event?),
        None => Err(eyre!("terminal input stream closed")),
    }
}

pub fn draw(state: &mut UiState, snap: &AppSnapshot) -> Result<()> {
    if state.view != snap.view.active {
        // A view switch invalidates whatever modal belonged to the old one.
        if !matches!(state.mode, Mode::QuitModal) {
            state.mode = Mode::Normal;
        }
        state.view = snap.view.active;
    }
    if let Some(mut term) = state.terminal.take() {
        term.draw(|f| ui(f, state, snap))?;
        state.terminal = Some(term);
    }
    Ok(())
}

/// Turns a terminal event into an action, editing form inputs in place while
/// a modal is open.
pub fn interpret_event(
    state: &mut UiState,
    inputs: &mut Inputs,
    event: Event,
) -> Option<UserEvent> {
    let k = match event {
        Event::Key(k) if k.kind == KeyEventKind::Press => k,
        Event::Resize(..) => return Some(UserEvent::Redraw),
        _ => return None,
    };
    if k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c') {
        return Some(UserEvent::Quit);
    }
    match state.mode {
        Mode::Normal => normal_key(state, k),
        Mode::QuitModal => match k.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(UserEvent::Quit),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
        Mode::WagerModal => text_modal_key(state, &mut inputs.wager, k, UserEvent::CreateMatch),
        Mode::RoomCodeModal => {
            text_modal_key(state, &mut inputs.room_code, k, UserEvent::JoinMatch)
        }
        Mode::TurnModal(field) => turn_modal_key(state, inputs, field, k),
    }
}

fn normal_key(state: &mut UiState, k: KeyEvent) -> Option<UserEvent> {
    if matches!(k.code, KeyCode::Char('q') | KeyCode::Esc) {
        state.mode = Mode::QuitModal;
        return Some(UserEvent::Redraw);
    }
    let KeyCode::Char(c) = k.code else {
        return None;
    };
    match (state.view, c) {
        (View::Wallet, 'c') => Some(UserEvent::ConnectWallet),
        (_, 'l') => Some(UserEvent::RefreshLeaderboard),
        (View::MatchOptions | View::Match, 'd') => Some(UserEvent::DisconnectWallet),
        (View::MatchOptions, 'n') => {
            state.mode = Mode::WagerModal;
            Some(UserEvent::Redraw)
        }
        (View::MatchOptions, 'j') => {
            state.mode = Mode::RoomCodeModal;
            Some(UserEvent::Redraw)
        }
        (View::Match, 'p') => {
            state.mode = Mode::TurnModal(TurnField::Card);
            Some(UserEvent::Redraw)
        }
        (View::Match, 'r') => Some(UserEvent::RefreshState),
        _ => None,
    }
}

fn text_modal_key(
    state: &mut UiState,
    value: &mut String,
    k: KeyEvent,
    submit: UserEvent,
) -> Option<UserEvent> {
    match k.code {
        KeyCode::Esc => {
            state.mode = Mode::Normal;
            Some(UserEvent::Redraw)
        }
        KeyCode::Enter => {
            state.mode = Mode::Normal;
            Some(submit)
        }
        KeyCode::Backspace => {
            value.pop();
            Some(UserEvent::Redraw)
        }
        KeyCode::Char(c) if !c.is_control() => {
            value.push(c);
            Some(UserEvent::Redraw)
        }
        _ => None,
    }
}

fn turn_modal_key(
    state: &mut UiState,
    inputs: &mut Inputs,
    field: TurnField,
    k: KeyEvent,
) -> Option<UserEvent> {
    match k.code {
        KeyCode::Tab | KeyCode::Down => {
            state.mode = Mode::TurnModal(field.next());
            Some(UserEvent::Redraw)
        }
        KeyCode::Left | KeyCode::Right => {
            cycle_preset(
                field.value_mut(inputs),
                &field.presets(),
                k.code == KeyCode::Right,
            );
            Some(UserEvent::Redraw)
        }
        _ => text_modal_key(state, field.value_mut(inputs), k, UserEvent::PlayTurn),
    }
}

fn ui(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    f.render_widget(Clear, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // status
            Constraint::Length(3), // notification
            Constraint::Min(10), // view + leaderboard
            Constraint::Length(HISTORY_LINES as u16 + 2), // history
            Constraint::Length(3), // help
        ])
        .split(f.area());

    draw_status(f, chunks[0], snap);
    draw_notification(f, chunks[1], snap.notification.as_ref());
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[2]);
    match snap.view.active {
        View::Wallet => draw_wallet_view(f, body[0]),
        View::MatchOptions => draw_options_view(f, body[0], &snap.inputs),
        View::Match => draw_match_view(f, body[0], &snap.view),
    }
    draw_leaderboard(f, body[1], &snap.view.leaderboard);
    draw_history(f, chunks[3], &snap.history);
    draw_help(f, chunks[4], state.view);
    draw_modals(f, state, &snap.inputs);
}

fn draw_status(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let mut spans = vec![Span::raw(snap.view.status_text.clone())];
    if let Some(busy) = &snap.busy {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            busy.clone(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ));
    }
    let status = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("ChronoClash"));
    f.render_widget(status, area);
}

fn notification_style(kind: NotificationKind) -> Style {
    match kind {
        NotificationKind::Success => Style::default().fg(Color::Green),
        NotificationKind::Error => Style::default().fg(Color::Red),
    }
}

fn draw_notification(f: &mut Frame, area: Rect, notification: Option<&Notification>) {
    let line = match notification {
        Some(n) => Line::styled(n.text.clone(), notification_style(n.kind)),
        None => Line::from(""),
    };
    let p = Paragraph::new(line)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Notification"));
    f.render_widget(p, area);
}

fn draw_wallet_view(f: &mut Frame, area: Rect) {
    let p = Paragraph::new(vec![
        Line::from("Connect a wallet to enter the arena."),
        Line::from(""),
        Line::from("Press c to connect."),
    ])
    .block(Block::default().borders(Borders::ALL).title("Wallet"));
    f.render_widget(p, area);
}

fn draw_options_view(f: &mut Frame, area: Rect, inputs: &Inputs) {
    let or_none = |s: &str| {
        if s.is_empty() {
            NONE_TEXT.to_owned()
        } else {
            s.to_owned()
        }
    };
    let p = Paragraph::new(vec![
        Line::from("n  create a room with a wager"),
        Line::from("j  join a room with its code"),
        Line::from(""),
        Line::from(format!("Wager: {}", or_none(&inputs.wager))),
        Line::from(format!("Room code: {}", or_none(&inputs.room_code))),
    ])
    .block(Block::default().borders(Borders::ALL).title("Match Options"));
    f.render_widget(p, area);
}

fn draw_match_view(f: &mut Frame, area: Rect, view: &ViewState) {
    let block = Block::default().borders(Borders::ALL).title("Match");
    let inner = block.inner(area);
    f.render_widget(block, area);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(3)])
        .split(inner);

    let label = Style::default().add_modifier(Modifier::BOLD);
    let field = |name: &'static str, value: &str| {
        Line::from(vec![
            Span::styled(format!("{name}: "), label),
            Span::raw(value.to_owned()),
        ])
    };
    let details = Paragraph::new(vec![
        field("Match ID", &view.match_id),
        field("Room Code", &view.room_code),
        field("Wager", &view.wager),
        field("Turn", &view.turn),
        field("Your Cards", &view.your_cards),
        field("Opponent Cards", &view.opponent_cards),
    ])
    .wrap(Wrap { trim: true });
    f.render_widget(details, rows[0]);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Tokens"))
        .gauge_style(Style::default().fg(Color::Cyan))
        .percent(view.tokens_percent)
        .label(view.tokens.clone());
    f.render_widget(gauge, rows[1]);
}

fn draw_leaderboard(f: &mut Frame, area: Rect, panel: &LeaderboardPanel) {
    let rows: Vec<Row> = match panel {
        LeaderboardPanel::Cleared => Vec::new(),
        LeaderboardPanel::Rows(rows) => rows
            .iter()
            .map(|r| {
                Row::new(vec![
                    r.rank.to_string(),
                    r.address.clone(),
                    r.wins.clone(),
                    r.tokens.clone(),
                ])
            })
            .collect(),
        LeaderboardPanel::NoData => vec![Row::new(vec![Cell::from("No leaderboard data")])],
        LeaderboardPanel::Error => vec![Row::new(vec![
            Cell::from("Error fetching leaderboard").style(Style::default().fg(Color::Red)),
        ])],
    };
    let widths = match panel {
        LeaderboardPanel::NoData | LeaderboardPanel::Error => vec![Constraint::Percentage(100)],
        _ => vec![
            Constraint::Length(4),
            Constraint::Length(14),
            Constraint::Length(6),
            Constraint::Min(6),
        ],
    };
    let header = Row::new(vec!["Rank", "Address", "Wins", "Tokens"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Leaderboard"));
    f.render_widget(table, area);
}

fn draw_history(f: &mut Frame, area: Rect, history: &[Notification]) {
    let lines: Vec<Line> = if history.is_empty() {
        vec![Line::styled("Nothing yet", Style::default().fg(Color::DarkGray))]
    } else {
        history
            .iter()
            .rev()
            .take(HISTORY_LINES)
            .map(|n| {
                Line::from(vec![
                    Span::styled(
                        format!("{} ", n.logged_at.format("%H:%M:%S")),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(n.text.clone(), notification_style(n.kind)),
                ])
            })
            .collect()
    };
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("History"));
    f.render_widget(p, area);
}

fn draw_help(f: &mut Frame, area: Rect, view: View) {
    let text = match view {
        View::Wallet => "c connect wallet | l leaderboard | q/Esc quit",
        View::MatchOptions => {
            "n create room | j join room | l leaderboard | d disconnect | q/Esc quit"
        }
        View::Match => {
            "p play turn | r refresh state | l leaderboard | d disconnect | q/Esc quit"
        }
    };
    let help = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, area);
}

fn draw_modals(f: &mut Frame, state: &UiState, inputs: &Inputs) {
    match state.mode {
        Mode::WagerModal => {
            draw_text_modal(f, "Create Room", "Wager: ", &inputs.wager);
        }
        Mode::RoomCodeModal => {
            draw_text_modal(f, "Join Room", "Room code: ", &inputs.room_code);
        }
        Mode::TurnModal(active) => {
            let area = centered_rect(50, 40, f.area());
            let block = Block::default().borders(Borders::ALL).title("Play Turn");
            let inner = block.inner(area);
            let mut lines = Vec::new();
            let mut cursor = None;
            for (row, field) in TurnField::ALL.into_iter().enumerate() {
                let selected = field == active;
                let prefix = format!("{} {}: ", if selected { ">" } else { " " }, field.label());
                let value = field.value(inputs);
                if selected {
                    let x = inner.x + (prefix.width() + value.width()) as u16;
                    cursor = Some(Position::new(x, inner.y + row as u16));
                }
                let style = if selected {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                lines.push(Line::styled(format!("{prefix}{value}"), style));
            }
            lines.push(Line::from(""));
            lines.push(Line::from("Tab next field | Left/Right pick | Enter play | Esc cancel"));
            f.render_widget(Clear, area);
            f.render_widget(block, area);
            f.render_widget(Paragraph::new(lines), inner);
            if let Some(position) = cursor {
                f.set_cursor_position(position);
            }
        }
        Mode::QuitModal => {
            let area = centered_rect(40, 20, f.area());
            let block = Block::default().borders(Borders::ALL).title("Confirm Quit");
            let p = Paragraph::new("Quit ChronoClash? (Y/N)");
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::Normal => {}
    }
}

fn draw_text_modal(f: &mut Frame, title: &str, prompt: &str, value: &str) {
    let area = centered_rect(40, 20, f.area());
    let block = Block::default().borders(Borders::ALL).title(title.to_owned());
    let inner = block.inner(area);
    let p = Paragraph::new(vec![
        Line::from(format!("{prompt}{value}")),
        Line::from(""),
        Line::from("Enter=confirm Esc=cancel"),
    ]);
    f.render_widget(Clear, area);
    f.render_widget(block, area);
    f.render_widget(p, inner);
    let x = inner.x + (prompt.width() + value.width()) as u16;
    f.set_cursor_position(Position::new(x, inner.y));
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1])[1]
}
