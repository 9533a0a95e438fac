//! Signal Extractor
//!
//! Heuristic pattern matching that pulls a token symbol, optional contract
//! address and optional price out of free-text channel messages. Produces an
//! `ExtractedSignal` or nothing; it never fails a message, it just declines it.

use anyhow::{Context, Result};
use regex::Regex;

use crate::types::ExtractedSignal;

/// Uppercase words that look like ticker symbols but never are.
const SYMBOL_STOPWORDS: &[&str] = &[
    "THE", "NEW", "GEM", "BUY", "SELL", "USD", "USDT", "USDC", "PUMP", "CALL", "ENTRY", "PRICE",
    "TOKEN", "CONTRACT", "ALERT", "HOT", "NOW",
];

/// Compiled extraction patterns for one monitored channel format
pub struct SignalExtractor {
    /// Symbol patterns, most specific first
    token_patterns: Vec<Regex>,
    /// Price patterns tried in order
    price_patterns: Vec<Regex>,
    /// Base58-style contract address
    address_pattern: Regex,
}

impl SignalExtractor {
    pub fn new() -> Result<Self> {
        let token_patterns = [
            r"\$([A-Za-z]{3,10})\b",
            r"(?i)Token:\s*([A-Za-z]{3,10})\b",
            r"\b([A-Z]{3,10})\b",
        ]
        .iter()
        .map(|p| Regex::new(p).with_context(|| format!("invalid token pattern {p}")))
        .collect::<Result<Vec<_>>>()?;

        let price_patterns = [
            r"(?i)Price:\s*\$?([0-9]*\.?[0-9]+)",
            r"(?i)Entry:\s*\$?([0-9]*\.?[0-9]+)",
            r"(?i)Buy at:\s*\$?([0-9]*\.?[0-9]+)",
            r"(?i)\$?([0-9]*\.?[0-9]+)\s*USD\b",
        ]
        .iter()
        .map(|p| Regex::new(p).with_context(|| format!("invalid price pattern {p}")))
        .collect::<Result<Vec<_>>>()?;

        let address_pattern = Regex::new(r"\b([1-9A-HJ-NP-Za-km-z]{32,44})\b")
            .context("invalid address pattern")?;

        Ok(Self {
            token_patterns,
            price_patterns,
            address_pattern,
        })
    }

    /// Extract a signal from message text, or `None` if no symbol is found.
    pub fn extract(&self, text: &str) -> Option<ExtractedSignal> {
        if text.is_empty() {
            return None;
        }

        let symbol = self.extract_symbol(text)?;
        let address = self.extract_address(text);
        let price = self.extract_price(text);

        Some(ExtractedSignal {
            symbol,
            address,
            price,
        })
    }

    fn extract_symbol(&self, text: &str) -> Option<String> {
        for pattern in &self.token_patterns {
            for captures in pattern.captures_iter(text) {
                if let Some(candidate) = captures.get(1).map(|m| sanitize_symbol(m.as_str())) {
                    if !candidate.is_empty() && !SYMBOL_STOPWORDS.contains(&candidate.as_str()) {
                        return Some(candidate);
                    }
                }
            }
        }
        None
    }

    fn extract_address(&self, text: &str) -> Option<String> {
        self.address_pattern
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }

    fn extract_price(&self, text: &str) -> Option<f64> {
        for pattern in &self.price_patterns {
            if let Some(captures) = pattern.captures(text) {
                if let Some(price) = captures.get(1).and_then(|m| m.as_str().parse::<f64>().ok())
                {
                    if validate_price(price) {
                        return Some(price);
                    }
                }
            }
        }
        None
    }
}

/// Clean a symbol candidate: uppercase, alphanumeric only, max 10 chars.
fn sanitize_symbol(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .take(10)
        .collect()
}

/// Reject prices outside any plausible token range.
fn validate_price(price: f64) -> bool {
    (1e-8..=1_000_000.0).contains(&price)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> SignalExtractor {
        SignalExtractor::new().unwrap()
    }

    #[test]
    fn extracts_dollar_prefixed_symbol() {
        let signal = extractor().extract("$BONK just launched!").unwrap();
        assert_eq!(signal.symbol, "BONK");
        assert!(signal.address.is_none());
    }

    #[test]
    fn extracts_labeled_token_and_price() {
        let signal = extractor()
            .extract("Token: wif \nEntry: $0.0042")
            .unwrap();
        assert_eq!(signal.symbol, "WIF");
        assert_eq!(signal.price, Some(0.0042));
    }

    #[test]
    fn extracts_bare_uppercase_symbol_skipping_stopwords() {
        let signal = extractor().extract("NEW GEM: POPCAT looking strong").unwrap();
        assert_eq!(signal.symbol, "POPCAT");
    }

    #[test]
    fn extracts_contract_address() {
        let text = "$BONK CA: DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";
        let signal = extractor().extract(text).unwrap();
        assert_eq!(
            signal.address.as_deref(),
            Some("DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263")
        );
    }

    #[test]
    fn price_pattern_order_prefers_explicit_labels() {
        let signal = extractor()
            .extract("$SOL Price: $142.5 target 200 USD")
            .unwrap();
        assert_eq!(signal.price, Some(142.5));
    }

    #[test]
    fn absurd_price_is_dropped() {
        let signal = extractor().extract("$SOL Price: 99999999999").unwrap();
        assert_eq!(signal.price, None);
    }

    #[test]
    fn no_symbol_means_no_signal() {
        assert!(extractor().extract("gm everyone, market is quiet").is_none());
        assert!(extractor().extract("").is_none());
    }
}
