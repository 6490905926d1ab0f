//! Text rendering of an engine snapshot.

use colored::{ColoredString, Colorize};
use numrush::prelude::*;

/// Board size in terminal cells.
const BOARD_COLS: usize = 60;
const BOARD_ROWS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Blank,
    Idle,
    Revealed,
    Fading,
    Culprit,
}

fn paint(text: &str, style: Style) -> ColoredString {
    match style {
        Style::Blank => text.normal(),
        Style::Idle => text.white().bold(),
        Style::Revealed => text.yellow().bold(),
        Style::Fading => text.dimmed(),
        Style::Culprit => text.white().on_red().bold(),
    }
}

fn style_of(target: &TargetView) -> Style {
    if target.is_game_over {
        return Style::Culprit;
    }
    match target.visual_state {
        VisualState::Idle => Style::Idle,
        VisualState::Revealed => Style::Revealed,
        VisualState::Fading => Style::Fading,
    }
}

/// Draws the targets into a framed grid. Targets with a higher layer are drawn
/// last so they end up on top.
pub fn board(snapshot: &Snapshot) -> String {
    let mut grid = vec![vec![(' ', Style::Blank); BOARD_COLS]; BOARD_ROWS];

    let mut targets: Vec<&TargetView> = snapshot.targets.iter().collect();
    targets.sort_by_key(|t| t.layer);
    for target in targets {
        let label = format!("({})", target.value);
        let col = cell(target.position.x, BOARD_COLS.saturating_sub(label.len()));
        let row = cell(target.position.y, BOARD_ROWS - 1);
        let style = style_of(target);
        for (i, ch) in label.chars().enumerate() {
            if let Some(slot) = grid[row].get_mut(col + i) {
                *slot = (ch, style);
            }
        }
    }

    let border = format!("+{}+", "-".repeat(BOARD_COLS));
    let mut out = String::new();
    out.push_str(&border.dimmed().to_string());
    out.push('\n');
    for row in &grid {
        out.push_str(&"|".dimmed().to_string());
        out.push_str(&render_row(row));
        out.push_str(&"|".dimmed().to_string());
        out.push('\n');
    }
    out.push_str(&border.dimmed().to_string());
    out
}

/// Maps a frame fraction onto a cell index in `0..=max`.
fn cell(fraction: f64, max: usize) -> usize {
    let scaled = (fraction.clamp(0.0, 1.0) * max as f64).round() as usize;
    scaled.min(max)
}

fn render_row(row: &[(char, Style)]) -> String {
    let mut out = String::new();
    let mut run = String::new();
    let mut run_style = Style::Blank;
    for &(ch, style) in row {
        if style != run_style && !run.is_empty() {
            out.push_str(&paint(&run, run_style).to_string());
            run.clear();
        }
        run_style = style;
        run.push(ch);
    }
    if !run.is_empty() {
        out.push_str(&paint(&run, run_style).to_string());
    }
    out
}

/// The banner and status lines shown above the board.
pub fn header(snapshot: &Snapshot) -> String {
    let banner = match snapshot.tone {
        MessageTone::Success => snapshot.message.green().bold(),
        MessageTone::Failure => snapshot.message.red().bold(),
        MessageTone::Neutral => snapshot.message.bold(),
    };
    let autoplay = match (snapshot.autoplay_enabled, snapshot.autoplay_active) {
        (true, true) => "ON (running)".green(),
        (true, false) => "ON".green(),
        (false, _) => "OFF".dimmed(),
    };
    let next = snapshot
        .next_hint
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{}\nPoints: {}   Time: {:.1}s   Next: {}   Autoplay: {}",
        banner,
        snapshot.point_count,
        snapshot.elapsed_secs,
        next.cyan().bold(),
        autoplay
    )
}

/// One line per clicked target with its remaining countdown.
pub fn countdowns(snapshot: &Snapshot) -> Option<String> {
    let parts: Vec<String> = snapshot
        .targets
        .iter()
        .filter_map(|t| {
            t.countdown_remaining
                .map(|c| paint(&format!("{}: {:.1}s", t.value, c), style_of(t)).to_string())
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("  "))
}

/// Header, board and countdown legend together.
pub fn screen(snapshot: &Snapshot) -> String {
    let mut out = header(snapshot);
    out.push('\n');
    out.push_str(&board(snapshot));
    if let Some(line) = countdowns(snapshot) {
        out.push('\n');
        out.push_str(&line);
    }
    out
}
