use serde::{Deserialize, Serialize};

/// How a sampled contour is read between frame centres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    Nearest,
    #[default]
    Linear,
    /// 4-point Lagrange interpolation.
    Cubic,
}

/// Reads `values` at a fractional frame `position`.
///
/// Positions up to half a frame outside the grid are clamped to the edge
/// frame; anything further out is undefined.
pub fn sample_at(values: &[f64], position: f64, mode: Interpolation) -> Option<f64> {
    let len = values.len();
    if len == 0 || !position.is_finite() {
        return None;
    }
    if position < -0.5 || position > len as f64 - 0.5 {
        return None;
    }
    if len == 1 {
        return Some(values[0]);
    }
    let position = position.clamp(0.0, (len - 1) as f64);
    let left = (position.floor() as usize).min(len - 2);
    let phase = position - left as f64;

    let value = match mode {
        Interpolation::Nearest => values[position.round() as usize],
        Interpolation::Linear => values[left] * (1.0 - phase) + values[left + 1] * phase,
        Interpolation::Cubic => {
            let at = |offset: isize| -> f64 {
                let idx = (left as isize + offset).clamp(0, len as isize - 1) as usize;
                values[idx]
            };
            lagrange4(at(-1), at(0), at(1), at(2), phase)
        }
    };
    Some(value)
}

/// Cubic through four equally spaced points, evaluated at `t` in `[0, 1]`
/// between the middle two.
fn lagrange4(y0: f64, y1: f64, y2: f64, y3: f64, t: f64) -> f64 {
    let tm1 = t + 1.0;
    let t1 = t - 1.0;
    let t2 = t - 2.0;
    -y0 * t * t1 * t2 / 6.0 + y1 * tm1 * t1 * t2 / 2.0 - y2 * tm1 * t * t2 / 2.0
        + y3 * tm1 * t * t1 / 6.0
}

/// Refines a local maximum at `index` with a parabola through its
/// neighbours; returns the fractional position and the peak value.
pub fn refine_maximum(values: &[f64], index: usize) -> (f64, f64) {
    if index == 0 || index + 1 >= values.len() {
        return (index as f64, values[index]);
    }
    let (left, centre, right) = (values[index - 1], values[index], values[index + 1]);
    let curvature = left - 2.0 * centre + right;
    if curvature >= 0.0 {
        return (index as f64, centre);
    }
    let offset = (0.5 * (left - right) / curvature).clamp(-0.5, 0.5);
    let peak = centre - 0.25 * (left - right) * offset;
    (index as f64 + offset, peak)
}
