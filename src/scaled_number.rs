use derive_more::From;
use serde::Serialize;
use std::{
    fmt::{Display, Write},
    str::FromStr,
};
use strum::FromRepr;

/// A number printed with an SI prefix, e.g. `0.0005` as `500µ`.
///
/// The precision (default 3) limits the decimals of the unscaled value; trailing zeros are
/// dropped so table values print as `5m` rather than `5.000m`.
#[derive(Debug, Clone, Copy, From, PartialEq, Serialize)]
pub struct ScaledNumber(pub f64);

impl Display for ScaledNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (unscaled, scale) = self.0.unscale();
        write_digits(f, unscaled)?;

        // respects alternate formatting
        scale.fmt(f)
    }
}

impl ScaledNumber {
    /// Formats as `<digits> <prefix><unit>`, e.g. `500 mV`.
    pub fn fmt_with_unit(&self, f: &mut std::fmt::Formatter<'_>, unit: &str) -> std::fmt::Result {
        let (unscaled, scale) = self.0.unscale();
        write_digits(f, unscaled)?;
        f.write_char(' ')?;
        scale.fmt(f)?;
        f.write_str(unit)
    }
}

fn write_digits(f: &mut std::fmt::Formatter<'_>, unscaled: f64) -> std::fmt::Result {
    let prec = f.precision().unwrap_or(3);

    let mut digits = if f.sign_plus() {
        format!("{unscaled:+.prec$}")
    } else {
        format!("{unscaled:.prec$}")
    };
    if digits.contains('.') {
        let trimmed = digits.trim_end_matches('0').trim_end_matches('.').len();
        digits.truncate(trimmed);
    }
    if digits == "-0" || digits == "+0" {
        digits = "0".into();
    }
    f.write_str(&digits)
}

impl FromStr for ScaledNumber {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ScaledNumber(
            f64::parse_scaled(s).ok_or("invalid scaled number")?,
        ))
    }
}

pub trait ScaledNumberExt: Sized {
    fn unscale(self) -> (f64, SiScale);
    fn parse_scaled(s: &str) -> Option<Self>;
}

impl ScaledNumberExt for f64 {
    fn unscale(self) -> (f64, SiScale) {
        if self == 0.0 || !self.is_finite() {
            return (self, SiScale::None);
        }

        let exp = ((self.abs().log10() / 3.0).floor() * 3.0) as i32;
        let exp = exp.clamp(SiScale::Pico as i32, SiScale::Giga as i32);
        let scale = SiScale::from_repr(exp as i8).unwrap_or_default();

        (self * 10.0f64.powi(-exp), scale)
    }

    fn parse_scaled(s: &str) -> Option<Self> {
        let s = s.trim();
        let last = s.chars().next_back()?;

        let (number, scale) = match SiScale::try_from(last) {
            Ok(scale) => (s[..s.len() - last.len_utf8()].trim_end(), scale),
            Err(()) => (s, SiScale::None),
        };

        Some(scale.apply_to(number.parse::<f64>().ok()?))
    }
}

#[derive(Debug, Default, FromRepr, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(i8)]
pub enum SiScale {
    Pico = -12,
    Nano = -9,
    Micro = -6,
    Milli = -3,
    #[default]
    None = 0,
    Kilo = 3,
    Mega = 6,
    Giga = 9,
}

impl SiScale {
    pub fn apply_to(self, unscaled: f64) -> f64 {
        unscaled * 10.0f64.powi(self as i8 as i32)
    }
}

impl TryFrom<char> for SiScale {
    type Error = ();
    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'p' => Ok(SiScale::Pico),
            'n' => Ok(SiScale::Nano),
            'u' | 'µ' => Ok(SiScale::Micro),
            'm' => Ok(SiScale::Milli),
            'k' | 'K' => Ok(SiScale::Kilo),
            'M' => Ok(SiScale::Mega),
            'G' => Ok(SiScale::Giga),
            _ => Err(()),
        }
    }
}

impl Display for SiScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = match self {
            SiScale::Pico => 'p',
            SiScale::Nano => 'n',
            SiScale::Micro => {
                if f.alternate() {
                    'u'
                } else {
                    'µ'
                }
            }
            SiScale::Milli => 'm',
            SiScale::None => return Ok(()),
            SiScale::Kilo => 'k',
            SiScale::Mega => 'M',
            SiScale::Giga => 'G',
        };

        f.write_char(c)
    }
}
