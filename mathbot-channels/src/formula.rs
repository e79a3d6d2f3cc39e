//! Formula registry.
//!
//! The bot knows seven fixed formulas ("variants"). Each variant has an
//! ordered list of argument names and a pure evaluation function. The table
//! is a process-wide constant: dispatch goes through the closed [`Variant`]
//! enum, so adding a variant without a formula does not compile.
//!
//! Evaluation never fails. Out-of-domain operations (division by zero,
//! `sqrt`/`ln` of negatives) follow IEEE-754 and yield infinities or NaN,
//! which [`Evaluation`] reports as [`Evaluation::Undefined`].

use serde::Serialize;
use std::f64::consts::PI;
use std::fmt;

/// Errors raised by registry lookups.
///
/// Both indicate a caller bug: the dialogue engine validates variant numbers
/// and argument counts before it reaches the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormulaError {
    #[error("Unknown variant {0}: variants are numbered 1 to 7")]
    UnknownVariant(i64),

    #[error("Variant {variant} takes {expected} arguments, got {actual}")]
    ArityMismatch {
        variant: u8,
        expected: usize,
        actual: usize,
    },
}

/// One of the seven formula variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Variant {
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
    V7,
}

impl Variant {
    /// All variants in menu order.
    pub const ALL: [Variant; 7] = [
        Self::V1,
        Self::V2,
        Self::V3,
        Self::V4,
        Self::V5,
        Self::V6,
        Self::V7,
    ];

    /// The user-facing number of this variant (1..=7).
    pub const fn number(self) -> u8 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
            Self::V3 => 3,
            Self::V4 => 4,
            Self::V5 => 5,
            Self::V6 => 6,
            Self::V7 => 7,
        }
    }

    /// Look up a variant by its user-facing number.
    pub fn from_number(n: i64) -> Result<Self, FormulaError> {
        match n {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            3 => Ok(Self::V3),
            4 => Ok(Self::V4),
            5 => Ok(Self::V5),
            6 => Ok(Self::V6),
            7 => Ok(Self::V7),
            other => Err(FormulaError::UnknownVariant(other)),
        }
    }

    /// The formula definition for this variant.
    pub fn spec(self) -> &'static VariantSpec {
        match self {
            Self::V1 => &VARIANT_1,
            Self::V2 => &VARIANT_2,
            Self::V3 => &VARIANT_3,
            Self::V4 => &VARIANT_4,
            Self::V5 => &VARIANT_5,
            Self::V6 => &VARIANT_6,
            Self::V7 => &VARIANT_7,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl TryFrom<i64> for Variant {
    type Error = FormulaError;

    fn try_from(n: i64) -> Result<Self, Self::Error> {
        Self::from_number(n)
    }
}

/// Immutable definition of one formula.
pub struct VariantSpec {
    pub variant: Variant,
    /// Argument labels in the order the user must enter them
    pub argument_names: &'static [&'static str],
    evaluate: fn(&[f64]) -> f64,
}

impl fmt::Debug for VariantSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantSpec")
            .field("variant", &self.variant)
            .field("argument_names", &self.argument_names)
            .finish_non_exhaustive()
    }
}

impl VariantSpec {
    /// Number of arguments the formula takes.
    pub const fn required_arg_count(&self) -> usize {
        self.argument_names.len()
    }

    /// Argument names joined for display, e.g. `a, b, c, n, x`.
    pub fn argument_list(&self) -> String {
        self.argument_names.join(", ")
    }

    /// Evaluate the formula on exactly `required_arg_count()` arguments.
    pub fn evaluate(&self, args: &[f64]) -> Result<Evaluation, FormulaError> {
        if args.len() != self.required_arg_count() {
            return Err(FormulaError::ArityMismatch {
                variant: self.variant.number(),
                expected: self.required_arg_count(),
                actual: args.len(),
            });
        }
        Ok(Evaluation::from_raw((self.evaluate)(args)))
    }

    /// Raw IEEE-754 result, without undefined-value classification.
    #[cfg(test)]
    fn evaluate_raw(&self, args: &[f64]) -> Result<f64, FormulaError> {
        match self.evaluate(args)? {
            Evaluation::Value(v) | Evaluation::Undefined(v) => Ok(v),
        }
    }
}

/// Outcome of evaluating a formula.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    /// Finite result
    Value(f64),
    /// Infinite or NaN result; keeps the raw value for logging
    Undefined(f64),
}

impl Evaluation {
    /// Classify a raw floating-point result.
    pub fn from_raw(value: f64) -> Self {
        if value.is_finite() {
            Self::Value(value)
        } else {
            Self::Undefined(value)
        }
    }

    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined(_))
    }
}

impl fmt::Display for Evaluation {
    /// Finite values use six decimal digits; everything else is `undefined`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.write_str(&round_half_up(*v, RESULT_DECIMALS)),
            Self::Undefined(_) => f.write_str("undefined"),
        }
    }
}

/// Digits after the decimal point in a rendered result.
const RESULT_DECIMALS: usize = 6;

/// Fixed-point rendering of a finite value, rounding half away from zero.
///
/// Rounding works on the shortest decimal form of `value` rather than on its
/// exact binary expansion, so `0.0078125` renders as `0.007813`.
fn round_half_up(value: f64, places: usize) -> String {
    let sign = if value.is_sign_negative() { "-" } else { "" };
    let shortest = value.abs().to_string();
    let (int_part, frac_part) = shortest.split_once('.').unwrap_or((&shortest, ""));

    if frac_part.len() <= places {
        return format!("{sign}{int_part}.{frac_part:0<places$}");
    }

    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(frac_part[..places].bytes())
        .map(|b| b - b'0')
        .collect();

    if frac_part.as_bytes()[places] >= b'5' {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == 9 {
                *digit = 0;
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, 1);
        }
    }

    let split = digits.len() - places;
    let render = |ds: &[u8]| ds.iter().map(|d| char::from(b'0' + d)).collect::<String>();
    format!("{sign}{}.{}", render(&digits[..split]), render(&digits[split..]))
}

/// Read-only lookup over the variant table keyed by raw variant numbers.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormulaRegistry;

impl FormulaRegistry {
    pub const fn new() -> Self {
        Self
    }

    /// Definition for a variant number.
    pub fn get(&self, variant_id: i64) -> Result<&'static VariantSpec, FormulaError> {
        Variant::from_number(variant_id).map(Variant::spec)
    }

    /// Ordered argument names used to prompt the user.
    pub fn describe(&self, variant_id: i64) -> Result<&'static [&'static str], FormulaError> {
        self.get(variant_id).map(|spec| spec.argument_names)
    }

    /// Number of arguments a variant takes.
    pub fn required_arg_count(&self, variant_id: i64) -> Result<usize, FormulaError> {
        self.get(variant_id).map(VariantSpec::required_arg_count)
    }

    /// Iterate over all definitions in menu order.
    #[cfg(test)]
    fn iter(&self) -> impl Iterator<Item = &'static VariantSpec> {
        Variant::ALL.into_iter().map(Variant::spec)
    }
}

// ============================================================================
// Formula table
// ============================================================================

static VARIANT_1: VariantSpec = VariantSpec {
    variant: Variant::V1,
    argument_names: &["a", "b", "c", "n", "x"],
    evaluate: formula_1,
};

static VARIANT_2: VariantSpec = VariantSpec {
    variant: Variant::V2,
    argument_names: &["a", "ω", "x", "y"],
    evaluate: formula_2,
};

static VARIANT_3: VariantSpec = VariantSpec {
    variant: Variant::V3,
    argument_names: &["a0", "a1", "a2", "x"],
    evaluate: formula_3,
};

static VARIANT_4: VariantSpec = VariantSpec {
    variant: Variant::V4,
    argument_names: &["a", "x"],
    evaluate: formula_4,
};

static VARIANT_5: VariantSpec = VariantSpec {
    variant: Variant::V5,
    argument_names: &["a", "b", "c", "d", "x"],
    evaluate: formula_5,
};

static VARIANT_6: VariantSpec = VariantSpec {
    variant: Variant::V6,
    argument_names: &["x"],
    evaluate: formula_6,
};

static VARIANT_7: VariantSpec = VariantSpec {
    variant: Variant::V7,
    argument_names: &["x"],
    evaluate: formula_7,
};

/// `5·a^(n·x) / (b + c) − √|cos(x³)|`
fn formula_1(args: &[f64]) -> f64 {
    let &[a, b, c, n, x] = args else {
        return f64::NAN;
    };
    5.0 * a.powf(n * x) / (b + c) - (x * x * x).cos().abs().sqrt()
}

/// `|x − y| / (1 + 2x)^a − e^√(1 + ω)`
fn formula_2(args: &[f64]) -> f64 {
    let &[a, omega, x, y] = args else {
        return f64::NAN;
    };
    (x - y).abs() / (1.0 + 2.0 * x).powf(a) - (1.0 + omega).sqrt().exp()
}

/// `√(a0 + a1·x + a2·∛|sin x|)`
fn formula_3(args: &[f64]) -> f64 {
    let &[a0, a1, a2, x] = args else {
        return f64::NAN;
    };
    (a0 + a1 * x + a2 * x.sin().abs().powf(1.0 / 3.0)).sqrt()
}

/// `ln|a⁷| + atan(x²) + π / √|a + x|`
fn formula_4(args: &[f64]) -> f64 {
    let &[a, x] = args else {
        return f64::NAN;
    };
    a.powi(7).abs().ln() + (x * x).atan() + PI / (a + x).abs().sqrt()
}

/// `((a + b)² / (c + d) + e^√(x + 1))^0.2`
fn formula_5(args: &[f64]) -> f64 {
    let &[a, b, c, d, x] = args else {
        return f64::NAN;
    };
    ((a + b).powi(2) / (c + d) + (x + 1.0).sqrt().exp()).powf(0.2)
}

/// `e^((2·sin 4x + cos²(x²)) / 3 · x)`
fn formula_6(args: &[f64]) -> f64 {
    let &[x] = args else {
        return f64::NAN;
    };
    ((2.0 * (4.0 * x).sin() + (x * x).cos().powi(2)) / 3.0 * x).exp()
}

/// `0.25·((1 + x²) / (1 − x) + 0.25·tan x)`
fn formula_7(args: &[f64]) -> f64 {
    let &[x] = args else {
        return f64::NAN;
    };
    0.25 * ((1.0 + x * x) / (1.0 - x) + 0.25 * x.tan())
}
