use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::widgets::{Block, Borders, Cell, Row, Table};
use ratatui::Frame;

use crate::pipeline::pattern::Pattern;

const NAME_WIDTH: u16 = 12;
const STEP_WIDTH: u16 = 3;

// one text line per instrument, for when there's no terminal to draw on
pub fn grid_lines(pattern: &Pattern) -> Vec<String> {
    pattern
        .rows()
        .iter()
        .map(|(inst, row)| {
            let steps: Vec<&str> = row.iter().map(|&hit| if hit { "x" } else { "." }).collect();
            format!("{:<10} | {}", inst.name(), steps.join(" "))
        })
        .collect()
}

pub fn grid_height(pattern: &Pattern) -> u16 {
    pattern.rows().len() as u16 + 3
}

pub fn draw_step_grid(frame: &mut Frame, area: Rect, pattern: &Pattern) {
    let hit = Style::default().fg(Color::LightMagenta).bg(Color::Magenta);
    let rest = Style::default().fg(Color::DarkGray);

    let header = std::iter::once(Cell::from(""))
        .chain((1..=pattern.length()).map(|i| Cell::from(i.to_string())));
    let rows: Vec<Row> = pattern
        .rows()
        .iter()
        .map(|(inst, row)| {
            let cells = row.iter().map(|&h| if h { Cell::from(" ● ").style(hit) } else { Cell::from(" · ").style(rest) });
            Row::new(std::iter::once(Cell::from(inst.name())).chain(cells))
        })
        .collect();

    let widths = std::iter::once(Constraint::Length(NAME_WIDTH))
        .chain(std::iter::repeat_n(Constraint::Length(STEP_WIDTH), pattern.length()));
    let table = Table::new(rows, widths)
        .column_spacing(0)
        .header(Row::new(header).style(Style::default().bold()))
        .block(Block::default().borders(Borders::ALL).title("Pattern"));
    frame.render_widget(table, area);
}
