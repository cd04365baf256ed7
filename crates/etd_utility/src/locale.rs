//! Locale conventions and money formatting.
//!
//! Conventions come from a built-in table instead of the process-wide C
//! locale, so formatting never depends on which locales the host installed.

use log::debug;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFAULT_MONEY_FORMAT: &str = "%!i";
const EURO_SIGN: &str = "€";
const EURO_ALIASES: &[&str] = &["Eu", "EUR"];

/// Numeric and monetary conventions of one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleConv {
    pub decimal_point: &'static str,
    pub thousands_sep: &'static str,
    pub mon_decimal_point: &'static str,
    pub mon_thousands_sep: &'static str,
    /// ISO 4217 code followed by its separator, e.g. `"EUR "`.
    pub int_curr_symbol: &'static str,
    pub currency_symbol: &'static str,
    pub frac_digits: usize,
    /// Whether the symbol precedes positive amounts.
    pub p_cs_precedes: bool,
    /// Whether a space separates the symbol from positive amounts.
    pub p_sep_by_space: bool,
}

const LOCALES: &[(&str, LocaleConv)] = &[
    (
        "C",
        LocaleConv {
            decimal_point: ".",
            thousands_sep: "",
            mon_decimal_point: ".",
            mon_thousands_sep: "",
            int_curr_symbol: "",
            currency_symbol: "",
            frac_digits: 2,
            p_cs_precedes: true,
            p_sep_by_space: false,
        },
    ),
    (
        "fr_FR",
        LocaleConv {
            decimal_point: ",",
            thousands_sep: " ",
            mon_decimal_point: ",",
            mon_thousands_sep: " ",
            int_curr_symbol: "EUR ",
            currency_symbol: "Eu",
            frac_digits: 2,
            p_cs_precedes: false,
            p_sep_by_space: true,
        },
    ),
    (
        "de_DE",
        LocaleConv {
            decimal_point: ",",
            thousands_sep: ".",
            mon_decimal_point: ",",
            mon_thousands_sep: ".",
            int_curr_symbol: "EUR ",
            currency_symbol: "€",
            frac_digits: 2,
            p_cs_precedes: false,
            p_sep_by_space: true,
        },
    ),
    (
        "en_US",
        LocaleConv {
            decimal_point: ".",
            thousands_sep: ",",
            mon_decimal_point: ".",
            mon_thousands_sep: ",",
            int_curr_symbol: "USD ",
            currency_symbol: "$",
            frac_digits: 2,
            p_cs_precedes: true,
            p_sep_by_space: false,
        },
    ),
    (
        "en_GB",
        LocaleConv {
            decimal_point: ".",
            thousands_sep: ",",
            mon_decimal_point: ".",
            mon_thousands_sep: ",",
            int_curr_symbol: "GBP ",
            currency_symbol: "£",
            frac_digits: 2,
            p_cs_precedes: true,
            p_sep_by_space: false,
        },
    ),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleError {
    UnknownLocale(String),
    UnsupportedFormat(String),
}

impl Display for LocaleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLocale(value) => write!(f, "unknown locale: {value}"),
            Self::UnsupportedFormat(value) => write!(f, "unsupported money format: {value}"),
        }
    }
}

impl Error for LocaleError {}

/// Formats numbers and money for one locale.
#[derive(Debug, Clone)]
pub struct LocaleFormatter {
    name: &'static str,
    conv: LocaleConv,
}

impl LocaleFormatter {
    /// Accepts `fr_FR`, `fr-fr` or `fr_FR.UTF-8` spellings.
    pub fn new(locale: &str) -> Result<Self, LocaleError> {
        let wanted = locale
            .split('.')
            .next()
            .unwrap_or_default()
            .trim()
            .replace('-', "_");
        let (name, conv) = LOCALES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| LocaleError::UnknownLocale(locale.to_string()))?;
        Ok(Self {
            name: *name,
            conv: conv.clone(),
        })
    }

    /// Returns the canonical name of the active locale.
    pub fn set_locale(&self) -> &'static str {
        debug!("event=locale_select module=locale status=ok locale={}", self.name);
        self.name
    }

    pub fn locale_conv(&self) -> LocaleConv {
        self.conv.clone()
    }

    /// Formats a plain number with the locale separators.
    pub fn number_format(&self, number: f64, decimals: usize) -> String {
        group_number(
            number,
            decimals,
            self.conv.decimal_point,
            self.conv.thousands_sep,
        )
    }

    /// Formats `number` following a `strfmon`-style `format` (default `%!i`).
    ///
    /// Supported: `%i`, `%n`, flags `!` (no symbol) and `^` (no grouping),
    /// right precision `.N`, and `%%`. The euro code is shown as `€`.
    pub fn money_format(&self, number: f64, format: Option<&str>) -> Result<String, LocaleError> {
        let format = format.unwrap_or(DEFAULT_MONEY_FORMAT);
        let mut out = String::new();
        let mut chars = format.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            if chars.peek() == Some(&'%') {
                chars.next();
                out.push('%');
                continue;
            }

            let mut spec = MoneySpec::default();
            loop {
                match chars.next() {
                    Some('!') => spec.no_symbol = true,
                    Some('^') => spec.no_grouping = true,
                    Some('.') => {
                        let mut digits = String::new();
                        while let Some(d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                            digits.push(*d);
                            chars.next();
                        }
                        spec.precision = Some(
                            digits
                                .parse()
                                .map_err(|_| LocaleError::UnsupportedFormat(format.to_string()))?,
                        );
                    }
                    Some('i') => {
                        spec.international = true;
                        break;
                    }
                    Some('n') => break,
                    _ => return Err(LocaleError::UnsupportedFormat(format.to_string())),
                }
            }
            out.push_str(&self.format_amount(number, &spec));
        }

        for alias in EURO_ALIASES {
            out = out.replace(alias, EURO_SIGN);
        }
        Ok(out)
    }

    fn format_amount(&self, number: f64, spec: &MoneySpec) -> String {
        let conv = &self.conv;
        let thousands = if spec.no_grouping {
            ""
        } else {
            conv.mon_thousands_sep
        };
        let amount = group_number(
            number,
            spec.precision.unwrap_or(conv.frac_digits),
            conv.mon_decimal_point,
            thousands,
        );

        if spec.no_symbol {
            return amount;
        }

        let (symbol, separated) = if spec.international {
            (conv.int_curr_symbol.trim_end(), true)
        } else {
            (conv.currency_symbol, conv.p_sep_by_space)
        };
        if symbol.is_empty() {
            return amount;
        }

        let space = if separated { " " } else { "" };
        if conv.p_cs_precedes {
            format!("{symbol}{space}{amount}")
        } else {
            format!("{amount}{space}{symbol}")
        }
    }
}

#[derive(Debug, Default)]
struct MoneySpec {
    no_symbol: bool,
    no_grouping: bool,
    international: bool,
    precision: Option<usize>,
}

fn group_number(number: f64, decimals: usize, decimal_point: &str, thousands: &str) -> String {
    let fixed = format!("{:.*}", decimals, number.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (fixed.as_str(), None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::new();
    for (index, digit) in digits.iter().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push_str(thousands);
        }
        grouped.push(*digit);
    }

    let mut out = String::new();
    let is_zero = fixed.chars().all(|c| c == '0' || c == '.');
    if number.is_sign_negative() && !is_zero {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac_part) = frac_part {
        out.push_str(decimal_point);
        out.push_str(frac_part);
    }
    out
}
