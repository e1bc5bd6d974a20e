use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::widgets::{Block, Borders, Row, Table};
use ratatui::Frame;

use crate::pipeline::project::Settings;

const LABEL_WIDTH: u16 = 22;

/// (parameter, value) pairs shown before generation.
pub fn config_rows(settings: &Settings) -> Vec<(String, String)> {
    let mut rows = vec![
        ("Style".to_string(), style_summary(settings)),
        ("BPM".to_string(), format!("{}", settings.bpm)),
        ("Note type".to_string(), settings.note_type.name().to_string()),
        ("Beat duration".to_string(), format!("{}ms", settings.beat_duration_ms())),
        ("Swing".to_string(), format!("{}%", settings.swing)),
        ("Complexity".to_string(), settings.complexity.name().to_string()),
        ("Pattern length".to_string(), settings.pattern_length.to_string()),
        ("Time signature".to_string(), settings.time_signature.name().to_string()),
        ("Subdivision".to_string(), settings.subdivision.name().to_string()),
        ("Fill frequency".to_string(), format!("{}", settings.fill_frequency)),
        ("Master volume".to_string(), settings.master_volume.to_string()),
        ("Loop repeats".to_string(), settings.loop_repeats.to_string()),
        ("Project name".to_string(), settings.project_name.clone()),
    ];
    for &inst in &settings.instruments {
        rows.push((
            format!("{} (vol/pan)", inst),
            format!("{} / {:+.2}", settings.volume(inst), settings.pan(inst)),
        ));
    }
    rows
}

fn style_summary(settings: &Settings) -> String {
    let style = settings.style;
    format!(
        "{} (template: {} bpm, swing {}%, {}, {})",
        style.name,
        style.bpm,
        style.swing,
        style.complexity.name(),
        style.time_signature.name()
    )
}

pub fn config_height(settings: &Settings) -> u16 {
    config_rows(settings).len() as u16 + 3 // borders + header
}

pub fn draw_config(frame: &mut Frame, area: Rect, settings: &Settings) {
    let rows: Vec<Row> = config_rows(settings)
        .into_iter()
        .map(|(name, value)| Row::new([name, value]))
        .collect();
    let table = Table::new(rows, [Constraint::Length(LABEL_WIDTH), Constraint::Min(10)])
        .header(Row::new(["Parameter", "Value"]).style(Style::default().bold()))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Magenta))
                .title("Rhythm Configuration"),
        );
    frame.render_widget(table, area);
}
