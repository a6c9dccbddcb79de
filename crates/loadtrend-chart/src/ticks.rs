//! Value axis range and tick units.
//!
//! Tick units come from a fixed graduated table (1, 2.5 and 5 times a power of
//! ten) and each unit carries the number of decimals its labels are printed
//! with. The smallest unit whose labels do not overlap is chosen.

/// Upper headroom added above the largest value, as a fraction of the range.
const UPPER_MARGIN: f64 = 0.05;

/// Upper bound on generated ticks, whatever the unit.
const MAX_TICKS: usize = 1_000;

/// One entry of the tick table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickUnit {
    pub size: f64,
    pub decimals: usize,
}

impl TickUnit {
    /// Formats `value` with this unit's decimals; integral units use `,`
    /// thousands grouping.
    #[must_use]
    pub fn format(&self, value: f64) -> String {
        // Avoid "-0.0" for values that round to zero.
        let value = if value.abs() < self.size / 2.0 { 0.0 } else { value };
        if self.decimals > 0 {
            format!("{value:.prec$}", prec = self.decimals)
        } else {
            group_thousands(value)
        }
    }
}

/// The graduated table, ascending: 10^k (k = -3..=11), 2.5·10^k
/// (k = -2..=11) and 5·10^k (k = -3..=11).
#[must_use]
pub fn standard_units() -> Vec<TickUnit> {
    let mut units = Vec::with_capacity(44);
    for k in -3..=11 {
        units.push(unit(1.0, k, decimals_for(k)));
    }
    for k in -2..=11 {
        units.push(unit(2.5, k, decimals_for(k - 1)));
    }
    for k in -3..=11 {
        units.push(unit(5.0, k, decimals_for(k)));
    }
    units.sort_by(|a, b| a.size.total_cmp(&b.size));
    units
}

fn unit(mantissa: f64, exponent: i32, decimals: usize) -> TickUnit {
    let size = if exponent < 0 {
        mantissa / 10f64.powi(-exponent)
    } else {
        mantissa * 10f64.powi(exponent)
    };
    TickUnit { size, decimals }
}

fn decimals_for(exponent: i32) -> usize {
    usize::try_from(-exponent).unwrap_or(0)
}

/// Picks the smallest unit giving at most `max_ticks` intervals over `range`.
#[must_use]
pub fn select_unit(range: f64, max_ticks: u32) -> TickUnit {
    let target = range.abs() / f64::from(max_ticks.max(1));
    let units = standard_units();
    let largest = units[units.len() - 1];
    units
        .into_iter()
        .find(|unit| unit.size >= target)
        .unwrap_or(largest)
}

/// Tick values between `lower` and `upper`, both inclusive, on multiples of
/// the unit.
#[must_use]
pub fn tick_values(range: ValueRange, unit: TickUnit) -> Vec<f64> {
    let first = (range.lower / unit.size).ceil() as i64;
    let last = (range.upper / unit.size).floor() as i64;
    (first..=last)
        .take(MAX_TICKS)
        .map(|step| step as f64 * unit.size)
        .collect()
}

/// Plotted value range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub lower: f64,
    pub upper: f64,
}

impl ValueRange {
    /// Range covering zero and every value, with headroom above the maximum.
    /// Without values, or when every value is zero, the range is `0..1`.
    #[must_use]
    pub fn including_zero(bounds: Option<(f64, f64)>) -> Self {
        let (min, max) = bounds.unwrap_or((0.0, 0.0));
        let lower = min.min(0.0);
        let upper = max.max(0.0);
        if upper - lower <= f64::EPSILON {
            return Self {
                lower: 0.0,
                upper: 1.0,
            };
        }
        Self {
            lower,
            upper: upper + (upper - lower) * UPPER_MARGIN,
        }
    }

    #[must_use]
    pub fn span(&self) -> f64 {
        self.upper - self.lower
    }

    /// Position of `value` in the range, 0 at `lower` and 1 at `upper`.
    #[must_use]
    pub fn fraction(&self, value: f64) -> f64 {
        (value - self.lower) / self.span()
    }
}

fn group_thousands(value: f64) -> String {
    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0.0 && digits != "0" {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
