use crate::styles;
use crate::tui::Mode;
use anyhow::Result;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};
use std::io::Stdout;
use textwrap::wrap;
use wander_session::SessionView;

const CRUMB_SEPARATOR: &str = "  ›  ";
const LEAD_LABEL_CHARS: usize = 22;

const HELP: &[(&str, &str)] = &[
    ("r", "random article, restarts the path"),
    ("b", "back one step"),
    ("/", "jump to a title or keywords"),
    ("1-9", "follow a lead"),
    ("s", "shuffle leads"),
    ("x", "reset"),
    ("q", "quit"),
];

/// Everything one frame needs; built before the session is borrowed by an
/// in-flight action.
pub struct Screen<'a> {
    pub view: &'a SessionView,
    pub mode: Mode,
    pub input: &'a str,
    pub input_cursor: usize,
    pub notice: Option<&'a str>,
    pub show_help: bool,
    pub busy: bool,
    pub spinner: &'static str,
}

/// `Path: A  ›  B  ›  C`
pub fn breadcrumb_line(crumbs: &[String]) -> String {
    format!("Path: {}", crumbs.join(CRUMB_SEPARATOR))
}

/// Lead buttons show at most 22 characters, with an ellipsis when cut.
pub fn lead_label(label: &str) -> String {
    if label.chars().count() > LEAD_LABEL_CHARS {
        let mut out: String = label.chars().take(LEAD_LABEL_CHARS).collect();
        out.push('…');
        out
    } else {
        label.to_string()
    }
}

pub fn draw(term: &mut Terminal<CrosstermBackend<Stdout>>, screen: &Screen<'_>) -> Result<()> {
    let view = screen.view;
    term.draw(|frame| {
        let area = frame.area();
        let lead_rows = view.links.len().max(1) as u16 + 2;

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(lead_rows),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(area);

        // Header + path
        let mut header = vec![Span::styled(" Wander ", styles::header())];
        if !view.breadcrumbs.is_empty() {
            header.push(Span::styled(breadcrumb_line(&view.breadcrumbs), styles::crumbs()));
        }
        frame.render_widget(Paragraph::new(Line::from(header)), layout[0]);

        // Note
        let content_width = layout[1].width.saturating_sub(2) as usize;
        let (note_title, note_items) = if screen.show_help {
            (" Keys ".to_string(), help_lines())
        } else {
            note_lines(view, content_width)
        };
        let note = List::new(note_items)
            .block(Block::default().borders(Borders::ALL).title(note_title));
        frame.render_widget(note, layout[1]);

        // Leads
        let leads: Vec<ListItem> = if view.links.is_empty() {
            vec![ListItem::new(Line::from(Span::styled(
                "No links found on this page. Press r for a random start or b to go back.",
                styles::dim(),
            )))]
        } else {
            view.links
                .iter()
                .enumerate()
                .map(|(i, l)| {
                    ListItem::new(Line::from(vec![
                        Span::styled(format!(" {} ", i + 1), styles::label()),
                        Span::styled(lead_label(&l.display_label), styles::value()),
                    ]))
                })
                .collect()
        };
        let leads =
            List::new(leads).block(Block::default().borders(Borders::ALL).title(" Pick a lead "));
        frame.render_widget(leads, layout[2]);

        // Input box
        let input = match screen.mode {
            Mode::Search => Paragraph::new(screen.input.to_string()),
            Mode::Keys => Paragraph::new(Span::styled("press / to jump", styles::dim())),
        };
        frame.render_widget(Clear, layout[3]);
        frame.render_widget(
            input.block(Block::default().borders(Borders::ALL).title(" Jump ")),
            layout[3],
        );
        if screen.mode == Mode::Search {
            frame.set_cursor_position(Position {
                x: layout[3].x + 1 + visual_caret_col(screen.input, screen.input_cursor),
                y: layout[3].y + 1,
            });
        }

        // Status bar
        let message = match (screen.notice, view.status.as_deref()) {
            (Some(n), _) => Span::styled(n.to_string(), styles::error()),
            (None, Some(s)) => Span::styled(s.to_string(), styles::error()),
            (None, None) if screen.busy => {
                Span::styled("Fetching…", Style::default().fg(Color::Yellow))
            }
            (None, None) => Span::styled(
                "r random · b back · / jump · 1-9 follow · s shuffle · x reset · q quit",
                styles::dim(),
            ),
        };
        let status_line = Line::from(vec![
            Span::raw(" "),
            Span::styled(screen.spinner, Style::default().fg(Color::Yellow)),
            Span::raw(" "),
            message,
        ]);
        let status = Paragraph::new(status_line)
            .block(Block::default().borders(Borders::ALL).title(" Status "));
        frame.render_widget(status, layout[4]);
    })?;

    Ok(())
}

fn note_lines(view: &SessionView, width: usize) -> (String, Vec<ListItem<'static>>) {
    let Some(article) = &view.current else {
        return (
            " Note ".to_string(),
            vec![ListItem::new(Span::styled(
                "No article yet. Press r to start wandering.",
                styles::dim(),
            ))],
        );
    };

    let mut items = vec![
        ListItem::new(Span::styled(article.title.clone(), styles::title())),
        ListItem::new(""),
    ];
    for raw in article.extract.split('\n') {
        if raw.is_empty() {
            items.push(ListItem::new(""));
            continue;
        }
        items.extend(
            wrap(raw, width.max(1))
                .into_iter()
                .map(|seg| ListItem::new(Span::styled(seg.into_owned(), styles::extract()))),
        );
    }
    items.push(ListItem::new(""));
    items.push(ListItem::new(Span::styled(article.url.clone(), styles::dim())));
    (" Note ".to_string(), items)
}

fn help_lines() -> Vec<ListItem<'static>> {
    HELP.iter()
        .map(|(key, what)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("  {key:<5}"), styles::label()),
                Span::styled(*what, styles::value()),
            ]))
        })
        .chain(std::iter::once(ListItem::new(Span::styled(
            "  Lines starting with / in the jump box are commands (/back, /3, /quit).",
            styles::dim(),
        ))))
        .collect()
}

fn visual_caret_col(input: &str, cursor: usize) -> u16 {
    use unicode_width::UnicodeWidthStr;
    UnicodeWidthStr::width(&input[..cursor]) as u16
}
