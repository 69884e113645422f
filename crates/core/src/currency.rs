use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest symbol accepted as a pattern anchor ("CHF", "R$", "zł", "лв." ...).
const MAX_SYMBOL_CHARS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurrencyError {
    #[error("Currency symbol is empty")]
    EmptySymbol,
    #[error("Currency symbol '{0}' cannot anchor an amount")]
    InvalidSymbol(String),
    #[error("Currency code '{0}' is not a three-letter ISO code")]
    InvalidCode(String),
    #[error("Unsupported decimal separator '{0}'")]
    InvalidDecimalSeparator(char),
}

/// The active currency for one extraction run.
///
/// Supplied by the caller and only ever read. A malformed context is not an
/// error for the engine: the symbol-anchored amount family is simply skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyContext {
    symbol: String,
    #[serde(default)]
    code: String,
    #[serde(default = "default_decimal_separator")]
    decimal_separator: char,
}

fn default_decimal_separator() -> char {
    '.'
}

impl Default for CurrencyContext {
    fn default() -> Self {
        CurrencyContext::new("$", "USD", '.')
    }
}

impl CurrencyContext {
    pub fn new(symbol: impl Into<String>, code: impl Into<String>, decimal_separator: char) -> Self {
        CurrencyContext {
            symbol: symbol.into(),
            code: code.into(),
            decimal_separator,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// `.` or `,`; anything else is treated as `.`.
    pub fn decimal_separator(&self) -> char {
        match self.decimal_separator {
            ',' => ',',
            _ => '.',
        }
    }

    pub fn grouping_separator(&self) -> char {
        if self.decimal_separator() == ',' {
            '.'
        } else {
            ','
        }
    }

    pub fn validate(&self) -> Result<(), CurrencyError> {
        self.validate_symbol()?;
        self.validate_code()?;
        if !matches!(self.decimal_separator, '.' | ',') {
            return Err(CurrencyError::InvalidDecimalSeparator(self.decimal_separator));
        }
        Ok(())
    }

    fn validate_symbol(&self) -> Result<(), CurrencyError> {
        let symbol = self.symbol.trim();
        if symbol.is_empty() {
            return Err(CurrencyError::EmptySymbol);
        }
        let bad = symbol.chars().count() > MAX_SYMBOL_CHARS
            || symbol
                .chars()
                .any(|c| c.is_ascii_digit() || c.is_whitespace() || c.is_control() || c == ',');
        if bad {
            return Err(CurrencyError::InvalidSymbol(symbol.to_string()));
        }
        Ok(())
    }

    fn validate_code(&self) -> Result<(), CurrencyError> {
        let code = self.code.trim();
        if code.is_empty() || (code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())) {
            Ok(())
        } else {
            Err(CurrencyError::InvalidCode(code.to_string()))
        }
    }

    /// Whether the symbol can be embedded in an amount pattern.
    pub fn has_usable_symbol(&self) -> bool {
        self.validate_symbol().is_ok()
    }

    /// A regex alternation matching this currency's symbol or ISO code,
    /// both escaped. `None` when neither is usable.
    pub fn anchor_pattern(&self) -> Option<String> {
        let mut alternatives = Vec::with_capacity(2);
        if self.has_usable_symbol() {
            alternatives.push(escape_symbol(&self.symbol));
        }
        if self.validate_code().is_ok() && !self.code.trim().is_empty() {
            alternatives.push(format!(r"\b{}\b", escape_symbol(&self.code.to_ascii_uppercase())));
        }
        if alternatives.is_empty() {
            None
        } else {
            Some(format!("(?:{})", alternatives.join("|")))
        }
    }
}

/// Escape a currency symbol (or any caller text) for literal use inside a
/// generated regex.
pub fn escape_symbol(symbol: &str) -> String {
    regex::escape(symbol.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    // ── escaping ────────────────────────────────────────────────────────────

    #[test]
    fn escape_dollar() {
        assert_eq!(escape_symbol("$"), r"\$");
        let re = Regex::new(&format!(r"{}\d+", escape_symbol("$"))).unwrap();
        assert!(re.is_match("$45"));
        assert!(!re.is_match("45"));
    }

    #[test]
    fn escape_ruble_is_literal() {
        assert_eq!(escape_symbol("₽"), "₽");
        let re = Regex::new(&format!(r"\d+\s*{}", escape_symbol("₽"))).unwrap();
        assert!(re.is_match("450 ₽"));
    }

    #[test]
    fn escape_real_keeps_prefix() {
        assert_eq!(escape_symbol("R$"), r"R\$");
        let re = Regex::new(&format!(r"^{}\s*\d", escape_symbol("R$"))).unwrap();
        assert!(re.is_match("R$ 12,50"));
        assert!(!re.is_match("$ 12,50"));
    }

    #[test]
    fn escape_handles_other_metacharacters() {
        for symbol in ["Fr.", "(€)", "[x]", "a|b", "^", "*"] {
            let re = Regex::new(&format!("^{}$", escape_symbol(symbol))).unwrap();
            assert!(re.is_match(symbol), "symbol {symbol:?} did not match itself");
        }
    }

    // ── validation ──────────────────────────────────────────────────────────

    #[test]
    fn validate_accepts_common_contexts() {
        assert!(CurrencyContext::new("$", "USD", '.').validate().is_ok());
        assert!(CurrencyContext::new("€", "EUR", ',').validate().is_ok());
        assert!(CurrencyContext::new("R$", "BRL", ',').validate().is_ok());
        assert!(CurrencyContext::new("₽", "", ',').validate().is_ok());
    }

    #[test]
    fn validate_rejects_malformed() {
        assert_eq!(
            CurrencyContext::new("  ", "USD", '.').validate(),
            Err(CurrencyError::EmptySymbol)
        );
        assert!(matches!(
            CurrencyContext::new("12", "USD", '.').validate(),
            Err(CurrencyError::InvalidSymbol(_))
        ));
        assert!(matches!(
            CurrencyContext::new("$", "DOLLARS", '.').validate(),
            Err(CurrencyError::InvalidCode(_))
        ));
        assert_eq!(
            CurrencyContext::new("$", "USD", ';').validate(),
            Err(CurrencyError::InvalidDecimalSeparator(';'))
        );
    }

    #[test]
    fn anchor_pattern_combines_symbol_and_code() {
        let ctx = CurrencyContext::new("$", "usd", '.');
        assert_eq!(ctx.anchor_pattern().as_deref(), Some(r"(?:\$|\bUSD\b)"));
    }

    #[test]
    fn anchor_pattern_falls_back_to_code() {
        let ctx = CurrencyContext::new("", "EUR", ',');
        assert_eq!(ctx.anchor_pattern().as_deref(), Some(r"(?:\bEUR\b)"));
        assert!(CurrencyContext::new("", "", '.').anchor_pattern().is_none());
    }

    #[test]
    fn separators_follow_context() {
        let eur = CurrencyContext::new("€", "EUR", ',');
        assert_eq!(eur.decimal_separator(), ',');
        assert_eq!(eur.grouping_separator(), '.');
        assert_eq!(CurrencyContext::default().grouping_separator(), ',');
    }

    #[test]
    fn deserializes_with_defaults() {
        let ctx: CurrencyContext = serde_json::from_str(r#"{"symbol":"£"}"#).unwrap();
        assert_eq!(ctx.symbol(), "£");
        assert_eq!(ctx.code(), "");
        assert_eq!(ctx.decimal_separator(), '.');
    }
}
