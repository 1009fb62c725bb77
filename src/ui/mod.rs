pub mod app;
pub mod log_buffer;
pub mod widgets;

use std::{
    io,
    time::{Duration, Instant},
};

use anyhow::Result;
use ratatui::{
    backend::CrosstermBackend,
    crossterm::{
        event::{self, Event},
        execute,
        terminal::{
            disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
            SetTitle,
        },
    },
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use crate::config::UI_REFRESH_INTERVAL;

use self::{
    app::App,
    widgets::{status_lines, FrameView, NoVideoPlaceholder},
};

pub const WINDOW_TITLE: &str = "Casa Inteligente - Monitoramento em Tempo Real";
pub const HEADING: &str = "Simulação de Casa Inteligente";

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(8),
        Constraint::Length(8),
        Constraint::Length(1),
    ])
    .split(f.area());

    draw_header(f, chunks[0]);

    let main = Layout::horizontal([Constraint::Length(44), Constraint::Min(20)]).split(chunks[1]);
    draw_status(f, app, main[0]);
    draw_video(f, app, main[1]);

    draw_log(f, app, chunks[2]);
    draw_footer(f, chunks[3]);
}

fn draw_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(Span::styled(
        HEADING,
        Style::default().add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {WINDOW_TITLE} "))
            .title_style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
    );
    f.render_widget(header, area);
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let status = Paragraph::new(status_lines(&app.snapshot))
        .block(Block::default().borders(Borders::ALL).title(" Estado "));
    f.render_widget(status, area);
}

fn draw_video(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Câmera {} ", app.canvas()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    match &app.frame {
        Some(frame) => f.render_widget(FrameView::new(frame.image()), inner),
        None => f.render_widget(NoVideoPlaceholder::new(app.canvas()), inner),
    }
}

fn draw_log(f: &mut Frame, app: &App, area: Rect) {
    let inner_height = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = app
        .recent_logs(inner_height)
        .into_iter()
        .map(|msg| Line::from(Span::raw(format!(" {msg}"))))
        .collect();

    let log = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Log "));
    f.render_widget(log, area);
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(vec![
        Span::styled(" [q]", Style::default().fg(Color::Yellow)),
        Span::styled(" Sair", Style::default().fg(Color::DarkGray)),
    ]));
    f.render_widget(footer, area);
}

/// Take over the terminal and refresh the window until the user closes it.
/// The terminal is restored even when drawing fails.
pub fn run(app: &mut App) -> Result<()> {
    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen, SetTitle(WINDOW_TITLE))?;
    let backend = CrosstermBackend::new(io::stdout());

    let result = match Terminal::new(backend) {
        Ok(mut terminal) => run_loop(&mut terminal, app),
        Err(e) => Err(e.into()),
    };

    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;

    result
}

fn run_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    let mut next_refresh = Instant::now();
    while !app.should_quit {
        app.refresh();
        terminal.draw(|f| draw(f, app))?;

        next_refresh += UI_REFRESH_INTERVAL;
        let now = Instant::now();
        if next_refresh < now {
            // Drawing fell behind; don't try to catch up.
            next_refresh = now;
        }

        // Handle every key that arrives before the next refresh is due.
        let mut timeout = next_refresh.saturating_duration_since(now);
        while event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
            timeout = next_refresh.saturating_duration_since(Instant::now());
            if app.should_quit || timeout == Duration::ZERO {
                break;
            }
        }
    }
    Ok(())
}
