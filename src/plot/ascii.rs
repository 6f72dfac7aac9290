//! ASCII plotting for terminal output.
//!
//! Fixed-size character grid, deterministic output.
//!
//! Plot elements:
//! - observed (seed) weights: `o`
//! - forecast trajectory: `-` line with `*` on each predicted day
//! - target weight: `=` horizontal line

use chrono::NaiveDate;

use crate::domain::{ObservationRecord, Prediction};

/// Plot the seed history followed by the forecast.
pub fn render_forecast_plot(
    history: &[ObservationRecord],
    predictions: &[Prediction],
    target_weight: Option<f64>,
    width: usize,
    height: usize,
) -> String {
    let Some(origin) = history
        .first()
        .map(|r| r.date)
        .or_else(|| predictions.first().map(|p| p.date))
    else {
        return "Plot: no data\n".to_string();
    };

    let observed: Vec<(f64, f64)> = history
        .iter()
        .map(|r| (day_offset(origin, r.date), r.avg_weight))
        .collect();
    let forecast: Vec<(f64, f64)> = predictions
        .iter()
        .map(|p| (day_offset(origin, p.date), p.predicted_weight))
        .collect();

    render_plot(&observed, &forecast, target_weight, width, height)
}

/// Plot a plain weight series (backfill output, interpolated curve).
pub fn render_series_plot(records: &[ObservationRecord], width: usize, height: usize) -> String {
    render_forecast_plot(records, &[], None, width, height)
}

fn day_offset(origin: NaiveDate, date: NaiveDate) -> f64 {
    (date - origin).num_days() as f64
}

fn render_plot(
    observed: &[(f64, f64)],
    forecast: &[(f64, f64)],
    target: Option<f64>,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let all = || observed.iter().chain(forecast.iter());
    let (x_min, x_max) = range(all().map(|p| p.0)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = range(all().map(|p| p.1).chain(target)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    if let Some(t) = target {
        let y = map_y(t, y_min, y_max, height);
        for cell in grid[y].iter_mut() {
            *cell = '=';
        }
    }

    // Line first so markers overlay it.
    let mut prev = observed.last().map(|&(x, y)| (map_x(x, x_min, x_max, width), map_y(y, y_min, y_max, height)));
    for &(x, y) in forecast {
        let cell = (map_x(x, x_min, x_max, width), map_y(y, y_min, y_max, height));
        if let Some((x0, y0)) = prev {
            draw_line(&mut grid, x0, y0, cell.0, cell.1, '-');
        }
        prev = Some(cell);
    }
    for &(x, y) in forecast {
        grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = '*';
    }
    for &(x, y) in observed {
        grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: day=[{x_min:.0}, {x_max:.0}] | weight=[{y_min:.3}, {y_max:.3}] kg\n"
    ));
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !(lo.is_finite() && hi.is_finite()) {
        None
    } else if hi > lo {
        Some((lo, hi))
    } else {
        Some((lo - 0.5, hi + 0.5))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // Row 0 is the top.
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham). Only fills blank or target cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let (mut x, mut y) = (x0 as isize, y0 as isize);
    let (x1, y1) = (x1 as isize, y1 as isize);

    let dx = (x1 - x).abs();
    let sx = if x < x1 { 1 } else { -1 };
    let dy = -(y1 - y).abs();
    let sy = if y < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if let Some(cell) = grid.get_mut(y as usize).and_then(|row| row.get_mut(x as usize)) {
            if *cell == ' ' || *cell == '=' {
                *cell = ch;
            }
        }
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}
