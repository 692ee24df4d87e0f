//! Input handling and arithmetic for a four-function keypad calculator.
//!
//! The heart of the crate is [`Engine`], a finite-state controller that
//! interprets each key press (digits, operators, equals, clear, negate,
//! percent) against a running three-operand expression `[ X OP1 Y OP2 Z ]`
//! and keeps track of what the display should show. It reproduces the
//! behavior of a hand-built calculator: chained operations, multiplicative
//! operators binding tighter than additive ones, percent-of-the-other-operand
//! semantics, and a two-tier clear button.
//!
//! ```
//! use tallypad::{Engine, Input, Operator};
//!
//! let mut engine = Engine::new();
//! for key in [
//!     Input::Digit('5'),
//!     Input::Op(Operator::Add),
//!     Input::Digit('3'),
//!     Input::Equals,
//! ] {
//!     engine.handle_input(key);
//! }
//! assert_eq!(engine.display_value(), "8");
//! ```

pub mod engine;
pub mod input;

pub use engine::{
    ClearMode, Engine, EngineError, Expression, Input, NOT_A_NUMBER, Operand, Operator, Slot,
    State,
};
