//! Key token classification.
//!
//! Maps raw input tokens (button ids, REPL words) onto the engine's closed
//! input vocabulary. A run of digits is a sequence of individual presses, so
//! a typed "12.5" expands to four digit inputs. Unknown tokens map to
//! nothing.

use lazy_static::lazy_static;
use regex::Regex;

use crate::engine::{Input, Operator};

lazy_static! {
    /// Matches a run of digits and decimal points, e.g. "42" or "12.5".
    static ref DIGIT_RUN: Regex = Regex::new(r"^[0-9.]+$").unwrap();
}

/// Classify a single token as one or more key presses.
///
/// Returns `None` for tokens outside the vocabulary.
pub fn parse_token(token: &str) -> Option<Vec<Input>> {
    if DIGIT_RUN.is_match(token) {
        return Some(token.chars().map(Input::Digit).collect());
    }

    let mut chars = token.chars();
    if let (Some(symbol), None) = (chars.next(), chars.next())
        && let Some(op) = Operator::from_symbol(symbol)
    {
        return Some(vec![Input::Op(op)]);
    }

    let input = match token {
        "x" | "X" | "×" => Input::Op(Operator::Multiply),
        "÷" => Input::Op(Operator::Divide),
        "=" => Input::Equals,
        "%" => Input::Percent,
        "n" | "±" | "+/-" => Input::Negate,
        _ => match token.to_ascii_lowercase().as_str() {
            "c" | "ac" | "clear" => Input::Clear,
            "neg" | "negate" => Input::Negate,
            "percent" => Input::Percent,
            "eq" | "equals" => Input::Equals,
            _ => return None,
        },
    };
    Some(vec![input])
}

/// Classify a whitespace-separated line of tokens, dropping (and logging)
/// anything unrecognized.
pub fn parse_line(line: &str) -> Vec<Input> {
    let mut inputs = Vec::new();
    for token in line.split_whitespace() {
        match parse_token(token) {
            Some(presses) => inputs.extend(presses),
            None => tracing::warn!(token, "ignoring unrecognized key token"),
        }
    }
    inputs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_run_expands_to_presses() {
        assert_eq!(
            parse_token("12.5"),
            Some(vec![
                Input::Digit('1'),
                Input::Digit('2'),
                Input::Digit('.'),
                Input::Digit('5'),
            ])
        );
    }

    #[test]
    fn test_operator_aliases() {
        assert_eq!(parse_token("+"), Some(vec![Input::Op(Operator::Add)]));
        assert_eq!(parse_token("x"), Some(vec![Input::Op(Operator::Multiply)]));
        assert_eq!(parse_token("×"), Some(vec![Input::Op(Operator::Multiply)]));
        assert_eq!(parse_token("÷"), Some(vec![Input::Op(Operator::Divide)]));
    }

    #[test]
    fn test_command_tokens() {
        assert_eq!(parse_token("="), Some(vec![Input::Equals]));
        assert_eq!(parse_token("C"), Some(vec![Input::Clear]));
        assert_eq!(parse_token("ac"), Some(vec![Input::Clear]));
        assert_eq!(parse_token("%"), Some(vec![Input::Percent]));
        assert_eq!(parse_token("+/-"), Some(vec![Input::Negate]));
        assert_eq!(parse_token("neg"), Some(vec![Input::Negate]));
    }

    #[test]
    fn test_unknown_tokens_drop() {
        assert_eq!(parse_token("hello"), None);
        assert_eq!(parse_token("1+2"), None);
        assert_eq!(parse_token(""), None);
    }

    #[test]
    fn test_line_parsing_skips_unknown() {
        let inputs = parse_line("5 + what 3 =");
        assert_eq!(
            inputs,
            vec![
                Input::Digit('5'),
                Input::Op(Operator::Add),
                Input::Digit('3'),
                Input::Equals,
            ]
        );
    }
}
