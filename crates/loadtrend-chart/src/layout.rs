//! Image sizing and legend packing.

use loadtrend_core::{RenderConfig, TrendGraph};

use crate::raster::GLYPH_SIZE;

/// Margin above the plot, holding the title.
pub const TOP_MARGIN: u32 = 28;
/// Margin left of the plot, holding tick labels and the axis label.
pub const LEFT_MARGIN: u32 = 60;
pub const RIGHT_MARGIN: u32 = 10;
/// Margin below the plot, holding the rotated category labels.
pub const BOTTOM_MARGIN: u32 = 44;

/// Minimum vertical distance between two tick labels.
pub const TICK_LABEL_SPACING: u32 = 20;

/// Colour swatch drawn before each legend label, including its gap.
pub const LEGEND_SWATCH_WIDTH: u32 = 14;
/// Space after each legend entry.
pub const LEGEND_ENTRY_GAP: u32 = 10;

/// Pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    #[must_use]
    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    #[must_use]
    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Geometry of one chart image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartLayout {
    pub width: u32,
    pub height: u32,
    pub plot: Rect,
    /// Legend entry indices (curve order) per legend row, top to bottom.
    pub legend_rows: Vec<Vec<usize>>,
    /// Top of the first legend row.
    pub legend_top: u32,
}

impl ChartLayout {
    /// Computes the geometry of `graph` under `config`.
    #[must_use]
    pub fn compute(graph: &TrendGraph, config: &RenderConfig) -> Self {
        let width = compute_width(graph.build_numbers().len(), config);

        let legend_rows = if graph.spec.has_legend() {
            let widths: Vec<u32> = graph
                .spec
                .curves()
                .iter()
                .map(|curve| legend_entry_width(curve.legend()))
                .collect();
            pack_legend(&widths, width)
        } else {
            Vec::new()
        };
        let height = compute_height(legend_rows.len(), config);

        let plot = Rect {
            x: LEFT_MARGIN,
            y: TOP_MARGIN,
            width: width.saturating_sub(LEFT_MARGIN + RIGHT_MARGIN),
            height: config
                .base_height
                .saturating_sub(TOP_MARGIN + BOTTOM_MARGIN),
        };

        Self {
            width,
            height,
            plot,
            legend_rows,
            legend_top: config.base_height,
        }
    }

    /// How many tick labels fit along the value axis without overlapping.
    #[must_use]
    pub fn max_ticks(&self) -> u32 {
        (self.plot.height / TICK_LABEL_SPACING).max(1)
    }
}

/// `max(base_width, build_count * per_build_width)`.
#[must_use]
pub fn compute_width(build_count: usize, config: &RenderConfig) -> u32 {
    let builds = u32::try_from(build_count).unwrap_or(u32::MAX);
    config
        .base_width
        .max(builds.saturating_mul(config.per_build_width))
}

/// `base_height + legend_rows * legend_row_height`.
#[must_use]
pub fn compute_height(legend_rows: usize, config: &RenderConfig) -> u32 {
    let rows = u32::try_from(legend_rows).unwrap_or(u32::MAX);
    config
        .base_height
        .saturating_add(rows.saturating_mul(config.legend_row_height))
}

/// Rendered width of a legend entry: swatch, label and trailing gap.
#[must_use]
pub fn legend_entry_width(label: &str) -> u32 {
    let chars = u32::try_from(label.chars().count()).unwrap_or(u32::MAX);
    LEGEND_SWATCH_WIDTH
        .saturating_add(chars.saturating_mul(GLYPH_SIZE))
        .saturating_add(LEGEND_ENTRY_GAP)
}

/// Packs legend entries into rows no wider than `max_width`.
///
/// Entries are visited widest first. Each entry not yet placed opens a row,
/// which is then topped up with the narrowest remaining entries while they
/// still fit. An entry wider than `max_width` gets a row of its own. Returns
/// the original indices per row.
#[must_use]
pub fn pack_legend(widths: &[u32], max_width: u32) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..widths.len()).collect();
    order.sort_by(|&a, &b| widths[b].cmp(&widths[a]).then(a.cmp(&b)));

    let mut placed = vec![false; widths.len()];
    let mut rows = Vec::new();

    for (pos, &index) in order.iter().enumerate() {
        if placed[index] {
            continue;
        }
        placed[index] = true;
        let mut row = vec![index];
        let mut used = widths[index];

        if used <= max_width {
            for &candidate in order[pos + 1..].iter().rev() {
                if placed[candidate] {
                    continue;
                }
                let next = used.saturating_add(widths[candidate]);
                if next <= max_width {
                    used = next;
                    placed[candidate] = true;
                    row.push(candidate);
                }
            }
        }

        row.sort_unstable();
        rows.push(row);
    }

    rows
}
