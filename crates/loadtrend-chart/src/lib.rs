//! PNG line charts for trend graphs.
//!
//! One image per graph: builds along the X axis as rotated `#N` categories,
//! values on a zero-based Y axis with graduated tick units, and a packed
//! legend under the plot for multi-curve graphs.

pub mod error;
pub mod layout;
pub mod raster;
pub mod renderer;
pub mod ticks;

pub use error::{ChartError, ChartResult};
pub use layout::{compute_height, compute_width, pack_legend, ChartLayout};
pub use renderer::{encode_png, ChartRenderer, RenderedChart};
pub use ticks::{select_unit, standard_units, TickUnit, ValueRange};
