//! Colours used for trend curves.

use crate::graph::Rgb;

/// Colour of the built-in average response time curve.
pub const AVERAGE_RESPONSE_COLOR: Rgb = Rgb::new(237, 184, 0);

/// Colour of the built-in error rate curve.
pub const ERROR_RATE_COLOR: Rgb = Rgb::new(200, 0, 0);

/// Round-robin palette for the curves of custom graphs.
pub const CURVE_PALETTE: [Rgb; 11] = [
    Rgb::new(0, 0, 255),
    Rgb::new(0, 255, 0),
    Rgb::new(255, 0, 0),
    Rgb::new(255, 0, 255),
    Rgb::new(0, 255, 255),
    Rgb::new(255, 175, 175),
    Rgb::new(255, 200, 0),
    Rgb::new(128, 128, 128),
    Rgb::new(255, 255, 0),
    Rgb::new(64, 64, 64),
    Rgb::new(192, 192, 192),
];

const BRIGHTEN_FACTOR: f64 = 0.7;

/// Returns the palette colour for the curve at `index`.
///
/// Once the palette is exhausted colours are reused, brightened once per
/// completed pass so that repeated hues stay distinguishable.
#[must_use]
pub fn curve_color(index: usize) -> Rgb {
    let base = CURVE_PALETTE[index % CURVE_PALETTE.len()];
    let passes = index / CURVE_PALETTE.len();
    (0..passes).fold(base, |color, _| brighten(color))
}

/// Brightens a colour by dividing each channel by 0.7.
///
/// Black becomes a dark grey and tiny non-zero channels are lifted first so
/// that the scaling has something to work with.
#[must_use]
pub fn brighten(color: Rgb) -> Rgb {
    let floor = (1.0 / (1.0 - BRIGHTEN_FACTOR)) as u8;
    if color.r == 0 && color.g == 0 && color.b == 0 {
        return Rgb::new(floor, floor, floor);
    }

    let scale = |channel: u8| -> u8 {
        let lifted = if channel > 0 && channel < floor {
            floor
        } else {
            channel
        };
        (f64::from(lifted) / BRIGHTEN_FACTOR).min(255.0) as u8
    };

    Rgb::new(scale(color.r), scale(color.g), scale(color.b))
}
