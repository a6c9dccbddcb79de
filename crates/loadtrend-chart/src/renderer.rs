use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};
use loadtrend_core::{BuildNumber, RenderConfig, TrendGraph, TrendSet};
use tracing::{debug, instrument};

use crate::error::{ChartError, ChartResult};
use crate::layout::{ChartLayout, LEGEND_SWATCH_WIDTH};
use crate::raster::{text_width, Canvas, AXIS, BLACK, GLYPH_SIZE, GRID, WHITE};
use crate::ticks::{select_unit, tick_values, ValueRange};

/// Smallest plot area worth drawing into.
const MIN_PLOT_SIDE: u32 = 16;

/// Summary of one written chart image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChart {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub legend_rows: usize,
    pub plotted_points: usize,
}

/// Renders trend graphs as PNG line charts.
#[derive(Debug, Clone, Default)]
pub struct ChartRenderer {
    config: RenderConfig,
}

impl ChartRenderer {
    #[must_use]
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// `<prefix><index>.png`, the index zero-padded to two digits.
    #[must_use]
    pub fn file_name(&self, index: usize) -> String {
        format!("{}{index:02}.png", self.config.file_prefix)
    }

    /// Writes one image per graph of `trend_set` into `dir`, in order.
    #[instrument(skip(self, trend_set), fields(graphs = trend_set.len()))]
    pub fn render(&self, trend_set: &TrendSet, dir: &Path) -> ChartResult<Vec<RenderedChart>> {
        fs::create_dir_all(dir).map_err(|e| ChartError::io(dir, e))?;

        trend_set
            .graphs()
            .iter()
            .enumerate()
            .map(|(index, graph)| self.render_graph(graph, &dir.join(self.file_name(index))))
            .collect()
    }

    /// Draws `graph` and writes it to `path` through a temporary file, so the
    /// destination only ever holds a complete image.
    pub fn render_graph(&self, graph: &TrendGraph, path: &Path) -> ChartResult<RenderedChart> {
        let (image, layout) = self.draw(graph)?;
        let bytes = encode_png(&image)?;
        write_atomically(path, &bytes)?;

        let chart = RenderedChart {
            path: path.to_path_buf(),
            width: layout.width,
            height: layout.height,
            legend_rows: layout.legend_rows.len(),
            plotted_points: graph.point_count(),
        };
        debug!(
            path = %chart.path.display(),
            width = chart.width,
            height = chart.height,
            points = chart.plotted_points,
            "chart written"
        );
        Ok(chart)
    }

    /// Draws `graph` into an in-memory image.
    pub fn draw(&self, graph: &TrendGraph) -> ChartResult<(RgbImage, ChartLayout)> {
        let layout = ChartLayout::compute(graph, &self.config);
        if layout.plot.width < MIN_PLOT_SIDE || layout.plot.height < MIN_PLOT_SIDE {
            return Err(ChartError::TooSmall {
                width: layout.width,
                height: layout.height,
            });
        }

        let mut canvas = Canvas::new(layout.width, layout.height, WHITE);
        let builds: Vec<BuildNumber> = graph.build_numbers().into_iter().collect();

        draw_title(&mut canvas, graph.spec.title(), layout.width);
        let range = draw_value_axis(&mut canvas, graph, &layout);
        draw_categories(&mut canvas, &builds, &layout);
        draw_curves(&mut canvas, graph, &builds, &layout, range);
        draw_legend(&mut canvas, graph, &layout, self.config.legend_row_height);

        Ok((canvas.into_image(), layout))
    }
}

/// Encodes an image as PNG in memory.
pub fn encode_png(image: &RgbImage) -> ChartResult<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

fn write_atomically(path: &Path, bytes: &[u8]) -> ChartResult<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    if let Err(e) = fs::write(&temp, bytes) {
        let _ = fs::remove_file(&temp);
        return Err(ChartError::io(&temp, e));
    }
    fs::rename(&temp, path).map_err(|e| {
        let _ = fs::remove_file(&temp);
        ChartError::io(path, e)
    })
}

fn draw_title(canvas: &mut Canvas, title: &str, width: u32) {
    let title = title.trim();
    if title.is_empty() {
        return;
    }
    let x = width.saturating_sub(text_width(title, 1)) / 2;
    canvas.bold_text(i64::from(x), 10, title, 1, BLACK);
}

fn value_y(layout: &ChartLayout, range: ValueRange, value: f64) -> i64 {
    let plot = layout.plot;
    let offset = range.fraction(value) * f64::from(plot.height);
    i64::from(plot.bottom()) - offset.round() as i64
}

fn draw_value_axis(canvas: &mut Canvas, graph: &TrendGraph, layout: &ChartLayout) -> ValueRange {
    let plot = layout.plot;
    let bounds = graph
        .curves
        .iter()
        .filter_map(|curve| curve.series.bounds())
        .reduce(|(lo, hi), (l, h)| (lo.min(l), hi.max(h)));
    let range = ValueRange::including_zero(bounds);
    let unit = select_unit(range.span(), layout.max_ticks());

    for value in tick_values(range, unit) {
        let y = value_y(layout, range, value);
        canvas.hline(i64::from(plot.x), i64::from(plot.right()), y, GRID);
        canvas.hline(i64::from(plot.x) - 3, i64::from(plot.x), y, AXIS);

        let label = unit.format(value);
        let x = i64::from(plot.x) - 5 - i64::from(text_width(&label, 1));
        canvas.text(x, y - i64::from(GLYPH_SIZE / 2), &label, 1, BLACK);
    }

    canvas.vline(i64::from(plot.x), i64::from(plot.y), i64::from(plot.bottom()), AXIS);
    canvas.hline(
        i64::from(plot.x),
        i64::from(plot.right()),
        i64::from(plot.bottom()),
        AXIS,
    );

    let label = graph.spec.y_label();
    let centre = i64::from(plot.y + plot.height / 2);
    canvas.text_up(2, centre + i64::from(text_width(label, 1) / 2), label, BLACK);

    range
}

fn category_x(layout: &ChartLayout, index: usize, count: usize) -> i64 {
    let plot = layout.plot;
    let slot = f64::from(plot.width) / count.max(1) as f64;
    i64::from(plot.x) + (slot * (index as f64 + 0.5)).round() as i64
}

fn draw_categories(canvas: &mut Canvas, builds: &[BuildNumber], layout: &ChartLayout) {
    let bottom = i64::from(layout.plot.bottom());
    for (index, build) in builds.iter().enumerate() {
        let x = category_x(layout, index, builds.len());
        let label = build.to_string();
        canvas.vline(x, bottom, bottom + 3, AXIS);
        let top = bottom + 5;
        canvas.text_up(
            x - i64::from(GLYPH_SIZE / 2),
            top + i64::from(text_width(&label, 1)) - 1,
            &label,
            BLACK,
        );
    }
}

fn draw_curves(
    canvas: &mut Canvas,
    graph: &TrendGraph,
    builds: &[BuildNumber],
    layout: &ChartLayout,
    range: ValueRange,
) {
    for curve in &graph.curves {
        let color = curve.spec.color();
        let mut previous: Option<(i64, i64)> = None;

        for (index, build) in builds.iter().enumerate() {
            let Some(value) = curve.series.get(*build) else {
                previous = None;
                continue;
            };
            let point = (
                category_x(layout, index, builds.len()),
                value_y(layout, range, value),
            );
            if let Some(from) = previous {
                canvas.thick_line(from, point, color);
            }
            canvas.marker(point.0, point.1, color);
            previous = Some(point);
        }
    }
}

fn draw_legend(canvas: &mut Canvas, graph: &TrendGraph, layout: &ChartLayout, row_height: u32) {
    let curves = graph.spec.curves();
    for (row_index, row) in layout.legend_rows.iter().enumerate() {
        let row_width: u32 = row
            .iter()
            .map(|&i| crate::layout::legend_entry_width(curves[i].legend()))
            .sum();
        let mut x = i64::from(layout.width.saturating_sub(row_width) / 2);
        let row_top = layout.legend_top + row_index as u32 * row_height;
        let y = i64::from(row_top + row_height.saturating_sub(GLYPH_SIZE) / 2);

        for &i in row {
            let curve = &curves[i];
            canvas.fill_rect(x, y, LEGEND_SWATCH_WIDTH - 4, GLYPH_SIZE, curve.color());
            canvas.text(
                x + i64::from(LEGEND_SWATCH_WIDTH),
                y,
                curve.legend(),
                1,
                BLACK,
            );
            x += i64::from(crate::layout::legend_entry_width(curve.legend()));
        }
    }
}
