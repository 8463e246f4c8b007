//! Landolt C rasterized to terminal cells.
//!
//! # Geometry
//!
//! In a unit square centered on the origin the ring spans radius 0.3 to
//! 0.5 (stroke width = diameter / 5). The gap is a bar one stroke wide
//! running from the center out through the ring in the target direction.
//!
//! Terminal cells are roughly twice as tall as they are wide, so a ring
//! `d` columns wide is drawn `d * ROW_ASPECT` rows tall.
//!
//! # Ladder scaling
//!
//! When the hardest level's calibrated ring is narrower than
//! [`MIN_DIAMETER_COLS`], every level is magnified by the same
//! [`ladder_scale`] factor, so 1.2 lands on the minimum and the other levels
//! keep their size ratios. Difficulty still rises along the ladder; only the
//! absolute size departs from calibration, and the HUD shows the factor.

use crate::visual_tone;
use acuity_core::calibration::Calibration;
use acuity_core::optotype::{Direction, DistanceCategory};
use acuity_core::staircase::MAX_LEVEL_INDEX;
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const OUTER_RADIUS: f64 = 0.5;
const INNER_RADIUS: f64 = 0.3;
const GAP_HALF_WIDTH: f64 = 0.1;

/// Rows per column for a visually round glyph.
pub const ROW_ASPECT: f64 = 0.5;

/// Smallest drawn diameter. Below this the gap stops being legible.
pub const MIN_DIAMETER_COLS: u16 = 10;

const FILLED: char = '█';
const EMPTY: char = ' ';

/// Calibrated diameter in terminal columns, before ladder scaling.
pub fn calibrated_columns(size_px: f64, cell_px: f64) -> f64 {
    if cell_px > 0.0 {
        size_px / cell_px
    } else {
        0.0
    }
}

/// Magnification applied to the whole ladder: `1.0` when the hardest level
/// is already legible, otherwise the factor that brings it to
/// [`MIN_DIAMETER_COLS`].
pub fn ladder_scale(calibration: &Calibration, distance: DistanceCategory, cell_px: f64) -> f64 {
    let hardest = calibration
        .size_for_index(MAX_LEVEL_INDEX, distance)
        .map(|px| calibrated_columns(px, cell_px))
        .unwrap_or(0.0);
    if hardest > 0.0 && hardest < MIN_DIAMETER_COLS as f64 {
        MIN_DIAMETER_COLS as f64 / hardest
    } else {
        1.0
    }
}

/// Diameter actually drawn: calibrated, times the ladder `scale`, limited to
/// what fits in `area`. Unusable sizes fall back to the minimum.
pub fn drawn_columns(size_px: f64, cell_px: f64, scale: f64, area: Rect) -> u16 {
    let wanted = (calibrated_columns(size_px, cell_px) * scale).round();
    let wanted = if wanted.is_finite() && wanted > 0.0 {
        wanted.min(u16::MAX as f64) as u16
    } else {
        MIN_DIAMETER_COLS
    };
    let fit_rows = (area.height as f64 / ROW_ASPECT).floor() as u16;
    wanted.min(area.width).min(fit_rows)
}

/// Rasterize a ring `diameter_cols` wide with its gap facing `direction`.
pub fn landolt_rows(diameter_cols: u16, direction: Direction) -> Vec<String> {
    if diameter_cols == 0 {
        return Vec::new();
    }
    let cols = diameter_cols as usize;
    let rows = ((diameter_cols as f64) * ROW_ASPECT).round().max(1.0) as usize;
    let (ux, uy) = direction.unit_vector();

    (0..rows)
        .map(|row| {
            let y = (row as f64 + 0.5) / rows as f64 - 0.5;
            (0..cols)
                .map(|col| {
                    let x = (col as f64 + 0.5) / cols as f64 - 0.5;
                    let radius = (x * x + y * y).sqrt();
                    let in_ring = (INNER_RADIUS..=OUTER_RADIUS).contains(&radius);
                    let along = x * ux + y * uy;
                    let across = x * uy - y * ux;
                    let in_gap = along > 0.0 && across.abs() < GAP_HALF_WIDTH;
                    if in_ring && !in_gap {
                        FILLED
                    } else {
                        EMPTY
                    }
                })
                .collect()
        })
        .collect()
}

/// What the optotype panel shows besides the ring itself.
pub enum PanelContent<'a> {
    Optotype {
        direction: Direction,
        level: f64,
        distance: DistanceCategory,
    },
    Message(Vec<Line<'a>>),
}

pub fn render_optotype_panel(
    frame: &mut Frame,
    area: Rect,
    content: PanelContent<'_>,
    calibration: &Calibration,
    cell_px: f64,
) {
    let block = Block::default()
        .title(" Optotype ")
        .borders(Borders::ALL)
        .border_style(visual_tone::panel_border());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match content {
        PanelContent::Optotype {
            direction,
            level,
            distance,
        } => {
            // Off-ladder levels never reach here; fall back to the minimum.
            let size_px = calibration.size_for_level(level, distance).unwrap_or(0.0);
            let scale = ladder_scale(calibration, distance, cell_px);
            let cols = drawn_columns(size_px, cell_px, scale, inner);
            let rows = landolt_rows(cols, direction);
            let top_pad = inner.height.saturating_sub(rows.len() as u16) / 2;
            let mut lines: Vec<Line> = (0..top_pad).map(|_| Line::from("")).collect();
            lines.extend(
                rows.into_iter()
                    .map(|row| Line::from(Span::styled(row, visual_tone::optotype()))),
            );
            frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
        }
        PanelContent::Message(message) => {
            let top_pad = inner.height.saturating_sub(message.len() as u16) / 2;
            let mut lines: Vec<Line> = (0..top_pad).map(|_| Line::from("")).collect();
            lines.extend(message);
            frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acuity_core::staircase::LEVELS;

    fn cell(rows: &[String], row: usize, col: usize) -> char {
        rows[row].chars().nth(col).unwrap()
    }

    #[test]
    fn ring_dimensions_follow_aspect() {
        let rows = landolt_rows(20, Direction::Right);
        assert_eq!(rows.len(), 10);
        assert!(rows.iter().all(|r| r.chars().count() == 20));
        assert!(landolt_rows(0, Direction::Up).is_empty());
    }

    #[test]
    fn gap_faces_each_direction() {
        // 20x10 grid: middle rows 4/5, middle columns 9/10.
        let right = landolt_rows(20, Direction::Right);
        assert_eq!(cell(&right, 4, 18), EMPTY);
        assert_eq!(cell(&right, 4, 1), FILLED);

        let left = landolt_rows(20, Direction::Left);
        assert_eq!(cell(&left, 5, 1), EMPTY);
        assert_eq!(cell(&left, 5, 18), FILLED);

        let up = landolt_rows(20, Direction::Up);
        assert_eq!(cell(&up, 0, 9), EMPTY);
        assert_eq!(cell(&up, 9, 9), FILLED);

        let down = landolt_rows(20, Direction::Down);
        assert_eq!(cell(&down, 9, 10), EMPTY);
        assert_eq!(cell(&down, 0, 10), FILLED);
    }

    #[test]
    fn center_is_hollow() {
        let rows = landolt_rows(20, Direction::Left);
        assert_eq!(cell(&rows, 5, 10), EMPTY);
    }

    #[test]
    fn drawn_size_respects_area_and_bad_input() {
        let big = Rect::new(0, 0, 200, 100);
        assert_eq!(drawn_columns(400.0, 8.0, 1.0, big), 50);
        let small = Rect::new(0, 0, 30, 8);
        assert_eq!(drawn_columns(4000.0, 8.0, 1.0, small), 16);
        assert_eq!(drawn_columns(f64::NAN, 8.0, 1.0, big), MIN_DIAMETER_COLS);
    }

    fn drawn_ladder(distance: DistanceCategory) -> Vec<u16> {
        let cal = Calibration::default();
        let scale = ladder_scale(&cal, distance, 8.0);
        let big = Rect::new(0, 0, 200, 100);
        LEVELS
            .iter()
            .map(|&level| {
                let px = cal.size_for_level(level, distance).unwrap();
                drawn_columns(px, 8.0, scale, big)
            })
            .collect()
    }

    #[test]
    fn drawn_sizes_shrink_along_the_ladder_at_both_distances() {
        for distance in [DistanceCategory::Near30Cm, DistanceCategory::Far3M] {
            let sizes = drawn_ladder(distance);
            assert!(
                sizes.windows(2).all(|w| w[0] > w[1]),
                "{distance}: {sizes:?}"
            );
            assert_eq!(sizes[MAX_LEVEL_INDEX], MIN_DIAMETER_COLS, "{distance}");
        }
        // Both distances subtend the same angle, so they draw alike.
        assert_eq!(
            drawn_ladder(DistanceCategory::Near30Cm),
            drawn_ladder(DistanceCategory::Far3M)
        );
    }

    #[test]
    fn legible_ladder_is_not_scaled() {
        // 4 px per column puts 1.2 at 3m near 11.8 columns.
        let scale = ladder_scale(&Calibration::default(), DistanceCategory::Far3M, 4.0);
        assert_eq!(scale, 1.0);
        let near = ladder_scale(&Calibration::default(), DistanceCategory::Near30Cm, 8.0);
        assert!(near > 16.0 && near < 17.0, "got {near}");
    }

    #[test]
    fn calibrated_columns_guards_zero_cell() {
        assert_eq!(calibrated_columns(80.0, 8.0), 10.0);
        assert_eq!(calibrated_columns(80.0, 0.0), 0.0);
    }
}
