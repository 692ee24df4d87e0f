//! The live calculation state.
//!
//! A calculation is a fixed three-operand window `[ X OP1 Y OP2 Z ]`. The
//! engine mutates a single [`Expression`] for its whole life; a new
//! calculation is just an ongoing mutation of the same structure.

use std::fmt;

use serde::Serialize;

/// Position in the three-operand grammar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum State {
    /// Fresh calculation with default inputs. Reachable again only via a
    /// full clear.
    #[default]
    Initial,
    /// Typing the first operand.
    SetX,
    /// First operator staged, second operand not yet started.
    SetOp1,
    /// Typing the second operand.
    SetY,
    /// Second operator staged, third operand not yet started.
    SetOp2,
    /// Typing the third operand.
    SetZ,
    /// A completed calculation. New input restarts the grammar.
    Equal,
}

/// One of the four arithmetic operators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Operator {
    #[default]
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    /// Multiplicative operators bind tighter than additive ones and fold
    /// immediately when chained.
    pub fn is_multiplicative(self) -> bool {
        matches!(self, Operator::Multiply | Operator::Divide)
    }

    pub fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '*',
            Operator::Divide => '/',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Operator> {
        match symbol {
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Subtract),
            '*' => Some(Operator::Multiply),
            '/' => Some(Operator::Divide),
            _ => None,
        }
    }
}

/// Which operand slot the readout shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Slot {
    #[default]
    X,
    Y,
    Z,
    /// Sentinel forcing a literal "0" readout without touching any operand.
    Zero,
}

/// A single operand: either digits exactly as typed, or a value produced by
/// an evaluation step. Conversion to a number happens only at evaluation
/// boundaries, so in-progress entry (a trailing ".", a toggled sign) survives
/// verbatim.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Operand {
    /// Digit-by-digit entry, kept verbatim.
    Entry(String),
    /// Result of an evaluation step.
    Value(f64),
}

impl Default for Operand {
    fn default() -> Self {
        Operand::Entry("0".to_string())
    }
}

impl Operand {
    /// Append one digit or the decimal point, following keypad entry rules:
    /// a second "." is ignored, a digit replaces a lone "0". Typing onto a
    /// computed value starts a fresh entry. Anything other than a digit or
    /// "." is ignored.
    pub fn push(&mut self, ch: char) {
        if !ch.is_ascii_digit() && ch != '.' {
            return;
        }
        let current = match self {
            Operand::Entry(text) => text.as_str(),
            Operand::Value(_) => "0",
        };
        let next = if ch == '.' {
            if current.contains('.') {
                return;
            }
            format!("{current}.")
        } else if current == "0" {
            ch.to_string()
        } else {
            format!("{current}{ch}")
        };
        *self = Operand::Entry(next);
    }

    /// Toggle the leading "-". An in-progress entry keeps its exact digits.
    pub fn negated(&self) -> Operand {
        match self {
            Operand::Entry(text) => Operand::Entry(match text.strip_prefix('-') {
                Some(rest) => rest.to_string(),
                None => format!("-{text}"),
            }),
            Operand::Value(value) => Operand::Value(-value),
        }
    }

    /// One hundredth of the operand, as a resolved value.
    pub fn percent(&self) -> Operand {
        Operand::Value(self.value() / 100.0)
    }

    /// Numeric reading, used at evaluation boundaries.
    pub fn value(&self) -> f64 {
        match self {
            Operand::Entry(text) => text.parse().unwrap_or(0.0),
            Operand::Value(value) => *value,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.value() == 0.0
    }

    /// Unformatted text of the operand.
    pub fn text(&self) -> String {
        match self {
            Operand::Entry(text) => text.clone(),
            Operand::Value(value) => format!("{value}"),
        }
    }
}

/// Snapshot of a running calculation: `[ X OP1 Y OP2 Z ]` plus the grammar
/// position, the displayed slot and the entry flags.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Expression {
    pub state: State,
    pub x: Operand,
    pub op1: Operator,
    pub y: Operand,
    pub op2: Operator,
    pub z: Operand,
    pub slot: Slot,
    /// Next digit starts a fresh operand instead of appending.
    pub(crate) start_new_operand: bool,
    /// A mid-expression percent already folded into `y`; the next equals
    /// must not count the percent base twice.
    pub(crate) from_percent: bool,
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} [ {} {} {} {} {} ]",
            self.state,
            self.x.text(),
            self.op1.symbol(),
            self.y.text(),
            self.op2.symbol(),
            self.z.text()
        )
    }
}
