//! Trial log panel -- the current eye's audit trail, newest at the bottom.
//!
//! Shows one row per applied answer: trial number, level shown, target,
//! answer and a tick or cross. Undo removes the last row, so the panel
//! always matches `TestState::history`.

use crate::visual_tone;
use acuity_core::staircase::TrialRecord;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render_trial_log(frame: &mut Frame, area: Rect, history: &[TrialRecord]) {
    let block = Block::default()
        .title(" Trials (Tab to hide) ")
        .borders(Borders::ALL)
        .border_style(visual_tone::panel_border());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if history.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "  (no answers yet)",
            visual_tone::muted(),
        )));
        frame.render_widget(empty, inner);
        return;
    }

    let (start, end) = visible_tail(history.len(), inner.height as usize);
    let mut lines = Vec::with_capacity(end - start + 1);
    lines.push(Line::from(Span::styled(
        "   #  level  target  answer",
        visual_tone::muted(),
    )));
    for (i, record) in history.iter().enumerate().take(end).skip(start) {
        let mark = if record.correct { "✓" } else { "✗" };
        lines.push(Line::from(vec![
            Span::styled(format!("{:>4} ", i + 1), visual_tone::muted()),
            Span::styled(format!("{:>5.1}  ", record.level()), visual_tone::info()),
            Span::raw(format!("{:<6}  ", record.target_direction.as_str())),
            Span::styled(
                format!("{:<6} ", record.answer_direction.as_str()),
                visual_tone::answer(record.correct),
            ),
            Span::styled(mark, visual_tone::answer(record.correct)),
        ]));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Window `[start, end)` of the newest rows that fit under the header line.
fn visible_tail(total: usize, height: usize) -> (usize, usize) {
    let usable = height.saturating_sub(1);
    if usable == 0 || total == 0 {
        return (0, 0);
    }
    (total.saturating_sub(usable), total)
}
