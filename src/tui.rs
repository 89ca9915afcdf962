use std::time::Duration;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crate::app::App;
use crate::ui;

/// Blocking draw/input loop. Polling runs on tokio tasks in the background,
/// so callers wrap this in `block_in_place`.
pub fn run(mut app: App) -> anyhow::Result<()> {
    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut app);
    ratatui::restore();
    result
}

fn event_loop(terminal: &mut ratatui::DefaultTerminal, app: &mut App) -> anyhow::Result<()> {
    loop {
        app.on_tick();
        terminal.draw(|f| ui::render(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char(c) => app.on_key(c),
                    KeyCode::Tab => app.on_key('\t'),
                    KeyCode::Esc => app.on_key('\u{1b}'),
                    KeyCode::Up => app.on_up(),
                    KeyCode::Down => app.on_down(),
                    _ => {}
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
