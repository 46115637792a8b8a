//! Terminal setup and event loop for the editor.
//!
//! Handles raw mode, the alternate screen, redraws and dispatching key
//! presses to [`EditorState`].

use crate::editor::render::render;
use crate::editor::state::{EditorOutcome, EditorState};
use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use std::{io, time::Duration};

/// Enters raw mode and the alternate screen, then runs the event loop until
/// the user quits.
///
/// The terminal is restored even if the loop fails.
pub(crate) fn run_terminal(state: &mut EditorState) -> io::Result<()> {
    install_panic_hook();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, state);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, Show)?;
    result
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, state: &mut EditorState) -> io::Result<()>
where
    io::Error: From<<B as Backend>::Error>,
{
    terminal.draw(|f| render(f, state))?;

    loop {
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if state.handle_key(key) == EditorOutcome::Quit {
                    break;
                }
                terminal.draw(|f| render(f, state))?;
            }
            Event::Resize(_, _) => {
                terminal.draw(|f| render(f, state))?;
            }
            _ => {}
        }
    }
    Ok(())
}

/// Leaves the alternate screen before a panic message is printed.
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
        previous(info);
    }));
}
