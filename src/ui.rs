use crate::figure::{FillKind, Figure, Rgb};
use anyhow::Result;
use crossterm::{
    cursor::Show,
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::canvas::{Canvas, Painter, Shape},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::io;

pub struct App<'a> {
    pub figure: &'a Figure,
    pub show_outlines: bool,
}

impl<'a> App<'a> {
    pub fn new(figure: &'a Figure) -> Self {
        Self {
            figure,
            show_outlines: true,
        }
    }

    pub fn toggle_outlines(&mut self) {
        self.show_outlines = !self.show_outlines;
    }
}

/// Raw mode + alternate screen for as long as it lives
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        // From here on, Drop undoes whatever got switched on
        let guard = TerminalGuard;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Best effort: every step runs even if an earlier one fails
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, LeaveAlternateScreen, Show);
    }
}

/// Show the figure full-screen until `q`/Esc
pub fn preview(figure: &Figure) -> Result<()> {
    let _guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let mut app = App::new(figure);
    run_app(&mut terminal, &mut app)?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App<'_>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('o') => app.toggle_outlines(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &App<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // Map
            Constraint::Length(34), // Legend / stats
        ])
        .split(f.size());

    render_map(f, chunks[0], app);
    render_side_panel(f, chunks[1], app);
}

fn render_map(f: &mut Frame, area: Rect, app: &App<'_>) {
    let figure = app.figure;
    let height = figure.height as f64;
    let flip = |(x, y): (f64, f64)| (x, height - y);

    let canvas = Canvas::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(format!(" {} ", figure.title)),
        )
        .marker(Marker::Braille)
        .x_bounds([figure.map_area.x, figure.map_area.right()])
        .y_bounds([height - figure.map_area.bottom(), height - figure.map_area.y])
        .paint(|ctx| {
            for layer in &figure.fills {
                let color = match layer.kind {
                    FillKind::Hole => Color::Reset,
                    _ => term_color(layer.color),
                };
                let ring: Vec<(f64, f64)> = layer.ring.iter().copied().map(flip).collect();
                ctx.draw(&FilledRing { ring: &ring, color });
            }

            if app.show_outlines {
                ctx.layer();
                let outline = term_color(figure.outline.color);
                for ring in &figure.outlines {
                    let ring: Vec<(f64, f64)> = ring.iter().copied().map(flip).collect();
                    ctx.draw(&Outline { ring: &ring, color: outline });
                }
            }
        });

    f.render_widget(canvas, area);
}

fn render_side_panel(f: &mut Frame, area: Rect, app: &App<'_>) {
    let panel = Paragraph::new(side_panel_lines(app.figure)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Legend "),
    );

    f.render_widget(panel, area);
}

fn side_panel_lines(figure: &Figure) -> Vec<Line<'static>> {
    let legend = &figure.legend;

    let mut lines = vec![
        Line::from(Span::styled(
            legend.label.clone(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    if let Some(colorbar) = &legend.colorbar {
        match colorbar.range {
            Some(range) => {
                for (t, label) in [(1.0, format!("{:.1}", range.max)), (0.5, String::new()), (0.0, format!("{:.1}", range.min))] {
                    lines.push(Line::from(vec![
                        Span::styled("████ ", Style::default().fg(term_color(colorbar.scale.color_at(t)))),
                        Span::raw(label),
                    ]));
                }
            }
            None => lines.push(Line::from(Span::styled(
                "no values",
                Style::default().fg(Color::DarkGray),
            ))),
        }
    }

    for patch in &legend.patches {
        lines.push(Line::from(vec![
            Span::styled("████ ", Style::default().fg(term_color(patch.color))),
            Span::raw(patch.label.clone()),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(format!("Tracts:      {}", figure.tracts.len())));
    lines.push(Line::from(Span::styled(
        format!("With values: {}", figure.valued_count()),
        Style::default().fg(Color::Green),
    )));
    lines.push(Line::from(Span::styled(
        format!("Missing:     {}", figure.missing_count()),
        Style::default().fg(Color::Red),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("o", Style::default().fg(Color::Yellow)),
        Span::raw(" Outlines | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ]));

    lines
}

fn term_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

// ============================================================================
// CANVAS SHAPES
// ============================================================================

/// Polygon ring filled by scanline over the canvas grid
struct FilledRing<'a> {
    ring: &'a [(f64, f64)],
    color: Color,
}

impl Shape for FilledRing<'_> {
    fn draw(&self, painter: &mut Painter) {
        let grid: Vec<(f64, f64)> = self
            .ring
            .iter()
            .filter_map(|&(x, y)| painter.get_point(x, y))
            .map(|(col, row)| (col as f64, row as f64))
            .collect();
        if grid.len() < 3 {
            return;
        }

        let min_row = grid.iter().map(|p| p.1).fold(f64::INFINITY, f64::min) as usize;
        let max_row = grid.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max) as usize;

        for row in min_row..=max_row {
            let yc = row as f64 + 0.5;
            let mut crossings: Vec<f64> = grid
                .windows(2)
                .filter_map(|edge| {
                    let (x0, y0) = edge[0];
                    let (x1, y1) = edge[1];
                    let spans = (y0 <= yc && yc < y1) || (y1 <= yc && yc < y0);
                    spans.then(|| x0 + (yc - y0) * (x1 - x0) / (y1 - y0))
                })
                .collect();
            crossings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

            for pair in crossings.chunks_exact(2) {
                let start = pair[0].round().max(0.0) as usize;
                let end = pair[1].round().max(0.0) as usize;
                for col in start..=end {
                    painter.paint(col, row, self.color);
                }
            }
        }

        // Tracts smaller than a cell still get one dot
        if let Some(&(col, row)) = grid.first() {
            painter.paint(col as usize, row as usize, self.color);
        }
    }
}

/// Closed polyline, sampled densely enough to look continuous in braille
struct Outline<'a> {
    ring: &'a [(f64, f64)],
    color: Color,
}

impl Shape for Outline<'_> {
    fn draw(&self, painter: &mut Painter) {
        for edge in self.ring.windows(2) {
            let (Some(a), Some(b)) = (
                painter.get_point(edge[0].0, edge[0].1),
                painter.get_point(edge[1].0, edge[1].1),
            ) else {
                continue;
            };

            let dx = b.0 as f64 - a.0 as f64;
            let dy = b.1 as f64 - a.1 as f64;
            let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
            for i in 0..=steps {
                let t = i as f64 / steps as f64;
                let col = (a.0 as f64 + dx * t).round() as usize;
                let row = (a.1 as f64 + dy * t).round() as usize;
                painter.paint(col, row, self.color);
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::{build_figure, ColorScheme, FigureSpec, MapStyle};

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_toggle_outlines() {
        let figure = build_figure(
            &[],
            &FigureSpec::new("Austin", "Children in Poverty", 2020, MapStyle::default()),
        );
        let mut app = App::new(&figure);
        assert!(app.show_outlines);
        app.toggle_outlines();
        assert!(!app.show_outlines);
    }

    #[test]
    fn test_side_panel_without_values() {
        let figure = build_figure(
            &[],
            &FigureSpec::new("Austin", "Children in Poverty", 2020, MapStyle::default()),
        );
        let lines: Vec<String> = side_panel_lines(&figure).iter().map(text).collect();

        assert_eq!(lines[0], "Children in Poverty");
        assert!(lines.contains(&"no values".to_string()));
        assert!(lines.contains(&"████ No data".to_string()));
    }

    #[test]
    fn test_side_panel_lists_categories() {
        let spec = FigureSpec::categorical(
            "Wayne",
            "Dominant Race/Ethnicity",
            2020,
            MapStyle::default(),
            ColorScheme::dominant_race(),
        );
        let figure = build_figure(&[], &spec);
        let lines: Vec<String> = side_panel_lines(&figure).iter().map(text).collect();

        assert_eq!(lines[0], "Dominant Race/Ethnicity");
        assert!(lines.contains(&"████ Hispanic/Latino".to_string()));
        assert!(lines.contains(&"████ Unknown".to_string()));
        assert!(!lines.iter().any(|l| l == "no values"));
    }
}
