//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use crate::app::{App, NoticeKind, fuzzy_match_positions};
use crate::config::{ControlsSettings, TimeField, UiSettings};
use crate::library::{Track, display_from_fields};
use crate::store::QueueStore;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    BTreeMap::from([
        ("j/k", "up/down"),
        ("gg/G", "top/bottom"),
        ("zz", "now playing"),
        ("enter", "play"),
        ("space/p", "play/pause"),
        ("h/l", "prev/next"),
        ("/", "filter"),
        ("s", "shuffle"),
        ("r", "repeat"),
        ("m", "mini player"),
        ("f", "favourite"),
        ("1/2/3", "all/favourites/playlists"),
        ("a", "add to playlist"),
        ("d", "remove from playlist"),
        ("o", "play spotlight"),
        ("K", "metadata"),
        ("R", "reload"),
        ("X", "delete song"),
        ("q", "quit"),
    ])
});

/// Render the controls help text, incorporating the seek step.
fn controls_text(controls: &ControlsSettings) -> String {
    // Keep the rendered order stable and human-friendly.
    let order = [
        "j/k", "h/l", "←/→", "↑/↓", "enter", "space/p", "gg/G", "zz", "/", "s", "r", "f", "1/2/3",
        "a", "d", "o", "m", "K", "R", "X", "q",
    ];
    order
        .iter()
        .filter_map(|k| match *k {
            "←/→" => Some(format!("[←/→] seek -/+{}s", controls.seek_seconds)),
            "↑/↓" => Some(format!(
                "[↑/↓] volume ±{:.0}%",
                controls.volume_step * 100.0
            )),
            _ => CONTROLS_MAP.get(*k).map(|v| format!("[{k}] {v}")),
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn now_playing_track_text(track: &Track, ui: &UiSettings) -> String {
    display_from_fields(
        &track.media_url,
        &track.name,
        &track.artists,
        track.album.as_deref(),
        &ui.now_playing_track_fields,
        &ui.now_playing_track_separator,
    )
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
fn now_playing_time_text(
    elapsed: Duration,
    total: Option<Duration>,
    ui: &UiSettings,
) -> Option<String> {
    if ui.now_playing_time_fields.is_empty() {
        return None;
    }

    let mut parts: Vec<String> = Vec::new();
    for f in &ui.now_playing_time_fields {
        match f {
            TimeField::Elapsed => parts.push(format_mmss(elapsed)),
            TimeField::Total => {
                if let Some(t) = total {
                    parts.push(format_mmss(t));
                }
            }
            TimeField::Remaining => {
                if let Some(t) = total {
                    let rem = t.saturating_sub(elapsed);
                    parts.push(format!("-{}", format_mmss(rem)));
                }
            }
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Format an optional duration, rounding up partial seconds, showing total seconds.
fn format_duration_mmss_ceil(d: Option<Duration>) -> String {
    let Some(d) = d else {
        return "-".to_string();
    };

    let mut total_secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        total_secs = total_secs.saturating_add(1);
    }

    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{}:{:02} ({}s)", minutes, seconds, total_secs)
}

/// Where a click at `column` lands on the progress bar, as a fraction.
pub fn seek_fraction(bar: Rect, column: u16) -> f32 {
    // The gauge is drawn inside a border.
    let inner_x = bar.x.saturating_add(1);
    let inner_w = bar.width.saturating_sub(2).max(1);
    let offset = column.saturating_sub(inner_x).min(inner_w);
    offset as f32 / inner_w as f32
}

pub fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}

fn left_pad() -> Padding {
    Padding {
        left: 1,
        right: 0,
        top: 0,
        bottom: 0,
    }
}

fn status_text(app: &App, store: &QueueStore, ui: &UiSettings) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push(if app.follow_playback {
        " CURSOR: Follow".to_string()
    } else {
        " CURSOR: Free-roam".to_string()
    });
    parts.push(format!("PLAYBACK: {}", store.repeat_mode().label()));

    let q = app.filter_query.trim();
    if app.filter_mode || !q.is_empty() {
        let mut filter_part = String::from("FILTER:");
        if !q.is_empty() {
            filter_part.push(' ');
            filter_part.push_str(q);
        }
        parts.push(filter_part);
    }

    match store.current() {
        Some(track) => {
            let song = now_playing_track_text(track, ui);
            match now_playing_time_text(store.progress(), store.duration(), ui) {
                Some(time) => parts.push(format!("Song: {song} [{time}]")),
                None => parts.push(format!("Song: {song}")),
            }
            parts.push(if store.is_playing() { "Playing" } else { "Paused" }.to_string());
        }
        None => parts.push("Stopped".to_string()),
    }

    parts.push(format!(
        "Shuffle: {}",
        if store.is_shuffle() { "ON" } else { "OFF" }
    ));
    parts.push(format!("Vol: {:.0}%", store.volume() * 100.0));
    if let Some(user) = &app.user {
        parts.push(format!("User: {}{}", user.name, if user.is_admin() { " (admin)" } else { "" }));
    }

    parts.join(" • ")
}

fn draw_progress(frame: &mut Frame, area: Rect, store: &QueueStore, preview: Option<f32>) {
    let live = match store.duration() {
        Some(d) if !d.is_zero() => store.progress().as_secs_f64() / d.as_secs_f64(),
        _ => 0.0,
    };
    let ratio = preview.map_or(live, f64::from).clamp(0.0, 1.0);

    let label = match (preview, store.duration()) {
        (Some(f), Some(d)) => format!("seek to {}", format_mmss(d.mul_f32(f))),
        (_, Some(d)) => format!("{} / {}", format_mmss(store.progress()), format_mmss(d)),
        (_, None) => format_mmss(store.progress()),
    };

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" progress "))
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(ratio)
        .label(label);
    frame.render_widget(gauge, area);
}

fn draw_notices(frame: &mut Frame, area: Rect, app: &App) {
    let lines: Vec<Line> = app
        .notices
        .iter()
        .map(|n| {
            let style = match n.kind {
                NoticeKind::Info => Style::default().fg(Color::Green),
                NoticeKind::Error => Style::default().fg(Color::Red),
            };
            Line::from(Span::styled(n.text.clone(), style))
        })
        .collect();
    if lines.is_empty() {
        return;
    }

    let width = lines
        .iter()
        .map(|l| l.width() as u16 + 4)
        .max()
        .unwrap_or(20)
        .min(area.width);
    let height = (lines.len() as u16 + 2).min(area.height);
    let toast = Rect {
        x: area.x + area.width.saturating_sub(width),
        y: area.y + area.height.saturating_sub(height),
        width,
        height,
    };
    frame.render_widget(Clear, toast);
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" notice ")),
        toast,
    );
}

fn draw_list(frame: &mut Frame, area: Rect, app: &App, display: &[usize]) {
    let q = app.filter_query.trim();
    let query_lower = q.to_ascii_lowercase();
    let rows = app.rows();

    // Center the selected item when possible by creating a visible window.
    // Only build ListItems for the visible window.
    let total = display.len();
    let list_height = area.height.saturating_sub(2) as usize;
    let sel_pos = display.iter().position(|&i| i == app.selected).unwrap_or(0);
    let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
        (0, total, sel_pos)
    } else {
        let half = list_height / 2;
        let mut start = sel_pos.saturating_sub(half);
        if start + list_height > total {
            start = total - list_height;
        }
        (start, start + list_height, sel_pos - start)
    };

    let visible_items: Vec<ListItem> = display[start..end]
        .iter()
        .map(|&i| {
            let track = &rows[i];
            let marker = if app.is_favourite(&track.id) { "♥ " } else { "  " };
            let title = &track.display;

            let positions = if q.is_empty() {
                None
            } else {
                app.match_positions(i, &query_lower)
                    .or_else(|| fuzzy_match_positions(title, q))
            };

            let mut spans = vec![Span::raw(marker)];
            match positions {
                Some(positions) if !positions.is_empty() => {
                    let mut pos_iter = positions.into_iter().peekable();
                    for (ci, ch) in title.chars().enumerate() {
                        if pos_iter.peek() == Some(&ci) {
                            pos_iter.next();
                            spans.push(Span::styled(
                                ch.to_string(),
                                Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                            ));
                        } else {
                            spans.push(Span::raw(ch.to_string()));
                        }
                    }
                }
                _ => spans.push(Span::raw(title.as_str())),
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let title = if app.loading {
        format!(" {} (loading…) ", app.view_title())
    } else {
        format!(" {} ({}) ", app.view_title(), total)
    };
    let list = List::new(visible_items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ratatui::widgets::ListState::default();
    if total > 0 {
        state.select(Some(selected_pos_in_visible));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_metadata(frame: &mut Frame, area: Rect, app: &App) {
    // Keep the popup inside the list area so it doesn't cover header/status/footer.
    let popup_area = centered_rect_sized(72, 10, area);
    frame.render_widget(Clear, popup_area);

    let meta = match app.selected_track() {
        Some(track) => format!(
            "Title: {}\nArtist: {}\nAlbum: {}\nDuration: {}\nSource: {}\nFavourite: {}",
            track.name,
            Some(track.artist_line())
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| "-".to_string()),
            track.album.as_deref().unwrap_or("-"),
            format_duration_mmss_ceil(track.duration),
            track.media_url,
            if app.is_favourite(&track.id) { "yes" } else { "no" },
        ),
        None => "No track selected".to_string(),
    };
    let meta_paragraph = Paragraph::new(meta)
        .block(
            Block::default()
                .padding(left_pad())
                .borders(Borders::ALL)
                .title(" metadata (K closes) "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(meta_paragraph, popup_area);
}

/// Render the entire UI. Returns the progress bar's area for mouse seeking.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    store: &QueueStore,
    seek_preview: Option<f32>,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) -> Rect {
    let status_par = Paragraph::new(status_text(app, store, ui_settings))
        .block(Block::bordered().padding(left_pad()).title(" status "))
        .wrap(Wrap { trim: true });

    if store.mini_player() {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)])
            .split(frame.area());
        frame.render_widget(status_par, chunks[0]);
        draw_progress(frame, chunks[1], store, seek_preview);
        draw_notices(frame, chunks[0], app);
        return chunks[1];
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let mut header_line = ui_settings.header_text.clone();
    if let Some(featured) = app.spotlight.current() {
        header_line.push_str(&format!("  ★ {}", featured.display));
    }
    let header = Paragraph::new(header_line).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" encore · {} ", app.source_label))
            .title_alignment(Alignment::Center),
    );
    frame.render_widget(header, chunks[0]);

    frame.render_widget(status_par.slow_blink(), chunks[1]);
    draw_progress(frame, chunks[2], store, seek_preview);

    let display = app.display_indices();
    draw_list(frame, chunks[3], app, &display);
    if app.metadata_window {
        draw_metadata(frame, chunks[3], app);
    }
    draw_notices(frame, chunks[3], app);

    let footer = Paragraph::new(controls_text(controls_settings))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(left_pad()),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);

    chunks[2]
}
