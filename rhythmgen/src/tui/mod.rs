// Run summaries drawn into an inline viewport under the shell prompt.
// Without a terminal (piped output, CI) the same content goes to the log.

pub mod grid;
pub mod view;

use std::io::stdout;

use crossterm::tty::IsTty;
use ratatui::backend::CrosstermBackend;
use ratatui::{Frame, Terminal, TerminalOptions, Viewport};
use tracing::{info, warn};

use crate::pipeline::pattern::Pattern;
use crate::pipeline::project::Settings;

pub fn show_config(settings: &Settings) {
    let drawn = stdout().is_tty()
        && draw_inline(view::config_height(settings), |frame| view::draw_config(frame, frame.area(), settings));
    if !drawn {
        info!("rhythm configuration:");
        for (name, value) in view::config_rows(settings) {
            info!("  {:<22} {}", name, value);
        }
    }
}

pub fn show_pattern(pattern: &Pattern) {
    let drawn = stdout().is_tty()
        && draw_inline(grid::grid_height(pattern), |frame| grid::draw_step_grid(frame, frame.area(), pattern));
    if !drawn {
        info!("pattern:");
        for line in grid::grid_lines(pattern) {
            info!("  {}", line);
        }
    }
}

// true when the frame made it to the screen
fn draw_inline(height: u16, render: impl FnOnce(&mut Frame)) -> bool {
    let result = (|| -> anyhow::Result<()> {
        let options = TerminalOptions { viewport: Viewport::Inline(height) };
        let mut term = Terminal::with_options(CrosstermBackend::new(stdout()), options)?;
        let completed = term.draw(render)?;
        let below = completed.area.bottom();
        term.set_cursor_position((0, below))?;
        term.show_cursor()?;
        Ok(())
    })();
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!("terminal drawing failed: {:#}", e);
            false
        }
    }
}
