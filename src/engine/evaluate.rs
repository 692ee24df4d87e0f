//! Arithmetic on operand pairs.
//!
//! Operands convert to floating point here and nowhere else; the result comes
//! back as a resolved [`Operand::Value`]. Division by zero is the only
//! failure and is handled by the engine, never surfaced to callers of the
//! public API.

use thiserror::Error;

use super::expression::{Operand, Operator};

/// The single error the evaluator can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("division by zero")]
    DivisionByZero,
}

/// Combine two operands under an operator.
pub(crate) fn combine(a: &Operand, b: &Operand, operator: Operator) -> Result<Operand, EngineError> {
    let (a, b) = (a.value(), b.value());
    let result = match operator {
        Operator::Add => a + b,
        Operator::Subtract => a - b,
        Operator::Multiply => a * b,
        Operator::Divide => {
            if b == 0.0 {
                return Err(EngineError::DivisionByZero);
            }
            a / b
        }
    };
    Ok(Operand::Value(result))
}
