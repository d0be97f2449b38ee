//! Typed coordinate vectors and the tolerant float comparison that decides
//! whether two sub-axes are the same.

use crate::catalog::identity::DataType;
use num_traits::Float;

/// Relative tolerance, in multiples of the type's machine epsilon, used when
/// comparing floating-point coordinate values.
const ULP_TOLERANCE: f64 = 4.0;

/// Coordinate values of one sub-axis, tagged by element type.
#[derive(Clone, Debug)]
pub enum CoordinateValues {
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl CoordinateValues {
    pub fn data_type(&self) -> DataType {
        match self {
            CoordinateValues::Int(_) => DataType::Int,
            CoordinateValues::Float(_) => DataType::Float,
            CoordinateValues::Double(_) => DataType::Double,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CoordinateValues::Int(values) => values.len(),
            CoordinateValues::Float(values) => values.len(),
            CoordinateValues::Double(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values widened to `f64`, mostly for display and tests.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            CoordinateValues::Int(values) => values.iter().map(|&v| f64::from(v)).collect(),
            CoordinateValues::Float(values) => values.iter().map(|&v| f64::from(v)).collect(),
            CoordinateValues::Double(values) => values.clone(),
        }
    }

    /// Bracketed, space-separated rendering: 17 significant digits for
    /// doubles, 8 for floats.
    pub fn to_bracketed_string(&self) -> String {
        let rendered: Vec<String> = match self {
            CoordinateValues::Int(values) => values.iter().map(i32::to_string).collect(),
            CoordinateValues::Float(values) => values
                .iter()
                .map(|&v| format_significant(f64::from(v), 8))
                .collect(),
            CoordinateValues::Double(values) => {
                values.iter().map(|&v| format_significant(v, 17)).collect()
            }
        };
        format!("[{}]", rendered.join(" "))
    }
}

/// Element-wise comparison; floats compare within tolerance.
impl PartialEq for CoordinateValues {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CoordinateValues::Int(a), CoordinateValues::Int(b)) => a == b,
            (CoordinateValues::Float(a), CoordinateValues::Float(b)) => all_almost_equal(a, b),
            (CoordinateValues::Double(a), CoordinateValues::Double(b)) => all_almost_equal(a, b),
            _ => false,
        }
    }
}

fn all_almost_equal<T: Float>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(&x, &y)| almost_equal(x, y))
}

/// `value` as an `i32` when it is integral and in range.
pub fn exact_i32(value: f64) -> Option<i32> {
    if value.fract() != 0.0 || value < f64::from(i32::MIN) || value > f64::from(i32::MAX) {
        return None;
    }
    Some(value as i32)
}

/// `value` rounded to `f32`, unless a finite value would overflow to
/// infinity. NaN and infinities pass through.
pub fn narrow_to_f32(value: f64) -> Option<f32> {
    let narrowed = value as f32;
    if value.is_finite() && !narrowed.is_finite() {
        return None;
    }
    Some(narrowed)
}

/// Float equality within a few ulps relative to the larger magnitude, with
/// an absolute floor at the smallest normal value so values near zero match.
pub fn almost_equal<T: Float>(a: T, b: T) -> bool {
    if a == b {
        return true;
    }
    if a.is_nan() && b.is_nan() {
        return true;
    }
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    let diff = (a - b).abs();
    let scale = a.abs().max(b.abs());
    let tolerance = num_traits::cast::<f64, T>(ULP_TOLERANCE).unwrap_or_else(T::one);
    diff <= T::epsilon() * scale * tolerance || diff < T::min_positive_value()
}

/// Render like C's `%.{digits}g`: fixed notation for moderate exponents,
/// scientific otherwise, trailing zeros removed.
pub fn format_significant(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let digits = digits.max(1);
    let scientific = format!("{:.*e}", digits - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if exponent < -4 || exponent >= digits as i32 {
        let mantissa = trim_fraction(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    } else {
        let decimals = (digits as i32 - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}
