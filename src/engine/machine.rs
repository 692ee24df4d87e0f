//! The input state machine.
//!
//! Each key press is interpreted against the current grammar position and
//! produces a new state, updated operands and a display selection. Chained
//! operations reduce left-to-right, multiplicative operators bind tighter
//! than additive ones, and clear is two-tier ("C" resets the live operand,
//! "AC" resets everything).

use std::sync::Arc;

use super::evaluate::{EngineError, combine};
use super::expression::{Expression, Operand, Operator, Slot, State};
use super::format;

/// Sentinel readout shown after a division by zero, until the next digit or
/// clear.
pub const NOT_A_NUMBER: &str = "Not a number";

/// One semantic key press. Operator keys carry their operator; whether it is
/// treated as additive or multiplicative follows from the operator itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    /// A digit `0`-`9` or the decimal point.
    Digit(char),
    /// One of the four arithmetic operator keys.
    Op(Operator),
    Equals,
    Clear,
    Negate,
    Percent,
}

/// What the next press of the clear key does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClearMode {
    /// Reset only the live operand of the current state.
    #[default]
    Partial,
    /// Reset the whole expression to defaults.
    Full,
}

impl ClearMode {
    /// The label the clear button should show.
    pub fn label(self) -> &'static str {
        match self {
            ClearMode::Partial => "C",
            ClearMode::Full => "AC",
        }
    }
}

type Sink = Arc<dyn Fn(&str) + Send + Sync>;

/// The calculator engine: a single [`Expression`] driven by key presses.
///
/// Construct one per calculator widget and feed it [`Input`] values; read the
/// formatted readout back with [`Engine::display_value`], or register sinks
/// to be notified after every handled press.
pub struct Engine {
    expr: Expression,
    error: bool,
    clear_mode: ClearMode,
    on_display: Option<Sink>,
    on_clear_label: Option<Sink>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            expr: Expression::default(),
            error: false,
            clear_mode: ClearMode::default(),
            on_display: None,
            on_clear_label: None,
        }
    }

    /// Register a callback invoked with the formatted readout after every
    /// handled press.
    pub fn set_on_display(&mut self, callback: impl Fn(&str) + Send + Sync + 'static) {
        self.on_display = Some(Arc::new(callback));
    }

    /// Register a callback invoked with the clear-button label ("C" or "AC")
    /// after every handled press.
    pub fn set_on_clear_label(&mut self, callback: impl Fn(&str) + Send + Sync + 'static) {
        self.on_clear_label = Some(Arc::new(callback));
    }

    /// Read-only snapshot of the live expression.
    pub fn expression(&self) -> &Expression {
        &self.expr
    }

    /// Whether the engine is showing the division-by-zero sentinel.
    pub fn is_error(&self) -> bool {
        self.error
    }

    /// Current clear-button label.
    pub fn clear_label(&self) -> &'static str {
        self.clear_mode.label()
    }

    /// The string the display should show right now.
    pub fn display_value(&self) -> String {
        if self.error {
            return NOT_A_NUMBER.to_string();
        }
        match self.expr.slot {
            Slot::X => format::thousands(&self.expr.x.text()),
            Slot::Y => format::thousands(&self.expr.y.text()),
            Slot::Z => format::thousands(&self.expr.z.text()),
            Slot::Zero => "0".to_string(),
        }
    }

    /// Apply one key press. Digits and clear always apply (and clear a
    /// pending error); every other key is a no-op while the error sentinel
    /// is showing. A division by zero aborts the offending transition,
    /// resets the expression and pins the readout to the sentinel.
    pub fn handle_input(&mut self, input: Input) {
        let outcome = match input {
            Input::Digit(digit) => {
                self.error = false;
                self.digit(digit);
                Ok(())
            }
            Input::Clear => {
                self.error = false;
                self.clear();
                Ok(())
            }
            _ if self.error => Ok(()),
            Input::Op(op) if op.is_multiplicative() => self.multiplicative_op(op),
            Input::Op(op) => self.additive_op(op),
            Input::Equals => self.equals(),
            Input::Negate => {
                self.negate();
                Ok(())
            }
            Input::Percent => self.percent(),
        };

        if outcome == Err(EngineError::DivisionByZero) {
            self.error = true;
            self.expr = Expression::default();
        }

        tracing::debug!(
            expression = %self.expr,
            readout = %self.display_value(),
            label = self.clear_label(),
            "handled input"
        );
        self.notify();
    }

    /// Digit or decimal point.
    fn digit(&mut self, digit: char) {
        if !digit.is_ascii_digit() && digit != '.' {
            return;
        }
        // Leaving the post-clear ZERO display discards the stale operands.
        if self.expr.slot == Slot::Zero {
            self.expr.x = Operand::default();
            self.expr.y = Operand::default();
            self.expr.slot = Slot::X;
        }
        let fresh = std::mem::take(&mut self.expr.start_new_operand);
        match self.expr.state {
            State::Initial => {
                self.expr.state = State::SetX;
                self.expr.x.push(digit);
            }
            State::SetX => {
                if fresh {
                    self.expr.x = Operand::default();
                }
                self.expr.x.push(digit);
                self.expr.slot = Slot::X;
            }
            State::SetOp1 => {
                self.expr.state = State::SetY;
                self.expr.y = Operand::default();
                self.expr.y.push(digit);
                self.expr.slot = Slot::Y;
            }
            State::SetY => {
                if fresh {
                    self.expr.y = Operand::default();
                }
                self.expr.y.push(digit);
                self.expr.slot = Slot::Y;
            }
            State::SetOp2 => {
                self.expr.state = State::SetZ;
                self.expr.z = Operand::default();
                self.expr.z.push(digit);
                self.expr.slot = Slot::Z;
            }
            State::SetZ => {
                if fresh {
                    self.expr.z = Operand::default();
                }
                self.expr.z.push(digit);
                self.expr.slot = Slot::Z;
            }
            State::Equal => {
                self.expr.state = State::SetX;
                self.expr.x = Operand::default();
                self.expr.x.push(digit);
                self.expr.slot = Slot::X;
            }
        }
        self.clear_mode = ClearMode::Partial;
    }

    /// `+` or `-`: reduce everything pending and stage the operator between
    /// X and the next operand.
    fn additive_op(&mut self, op: Operator) -> Result<(), EngineError> {
        match self.expr.state {
            State::SetY | State::SetZ => {
                self.expr.y = combine(&self.expr.y, &self.expr.z, self.expr.op2)?;
                self.expr.x = combine(&self.expr.x, &self.expr.y, self.expr.op1)?;
                self.expr.y = self.expr.x.clone();
                self.expr.z = Operand::default();
                self.expr.op2 = Operator::Add;
                self.expr.state = State::SetOp1;
                self.expr.op1 = op;
                self.expr.slot = Slot::X;
            }
            State::SetOp2 => {
                self.expr.x = combine(&self.expr.x, &self.expr.y, self.expr.op1)?;
                self.expr.y = self.expr.x.clone();
                self.expr.op1 = op;
                self.expr.op2 = Operator::Add;
                self.expr.z = Operand::default();
                self.expr.state = State::SetOp1;
                self.expr.slot = Slot::X;
            }
            // Overriding the operator before the second operand is typed.
            State::Initial | State::SetX | State::SetOp1 => {
                self.expr.y = self.expr.x.clone();
                self.expr.state = State::SetOp1;
                self.expr.op1 = op;
            }
            State::Equal => {
                self.expr.state = State::SetOp1;
                self.expr.op1 = op;
            }
        }
        Ok(())
    }

    /// `*` or `/`: binds tighter. Consecutive multiplicative operators fold
    /// left-to-right without waiting; after an additive operator the new one
    /// is staged as operator2 until a third operand or a reduction arrives.
    fn multiplicative_op(&mut self, op: Operator) -> Result<(), EngineError> {
        match self.expr.state {
            State::SetY => {
                if self.expr.op1.is_multiplicative() {
                    self.expr.x = combine(&self.expr.x, &self.expr.y, self.expr.op1)?;
                    self.expr.y = self.expr.x.clone();
                    self.expr.state = State::SetOp1;
                    self.expr.op1 = op;
                    self.expr.slot = Slot::X;
                } else {
                    self.expr.state = State::SetOp2;
                    self.expr.op2 = op;
                }
            }
            // Last multiplicative operator wins.
            State::SetOp2 => {
                self.expr.op2 = op;
            }
            State::SetZ => {
                self.expr.y = combine(&self.expr.y, &self.expr.z, self.expr.op2)?;
                self.expr.z = Operand::default();
                self.expr.state = State::SetOp2;
                self.expr.op2 = op;
                self.expr.slot = Slot::Y;
            }
            State::Initial | State::SetX | State::SetOp1 | State::Equal => {
                self.expr.y = self.expr.x.clone();
                self.expr.state = State::SetOp1;
                self.expr.op1 = op;
            }
        }
        Ok(())
    }

    /// `=`: reduce whatever is pending, operator2 first, then operator1.
    fn equals(&mut self) -> Result<(), EngineError> {
        match self.expr.state {
            State::SetOp2 => {
                self.expr.x = combine(&self.expr.x, &self.expr.y, self.expr.op2)?;
                self.expr.x = combine(&self.expr.x, &self.expr.y, self.expr.op1)?;
                self.expr.op1 = self.expr.op2;
            }
            State::SetZ => {
                if self.expr.z.is_zero() {
                    self.expr.x = combine(&self.expr.x, &self.expr.y, self.expr.op2)?;
                    self.expr.x = combine(&self.expr.x, &self.expr.y, self.expr.op1)?;
                } else {
                    self.expr.y = combine(&self.expr.y, &self.expr.z, self.expr.op2)?;
                    self.expr.x = combine(&self.expr.x, &self.expr.y, self.expr.op1)?;
                    self.expr.y = self.expr.z.clone();
                }
                self.expr.z = Operand::default();
                self.expr.op1 = self.expr.op2;
                self.expr.op2 = Operator::Add;
            }
            State::SetY => {
                if self.expr.from_percent {
                    self.expr.x = combine(&self.expr.x, &self.expr.y, self.expr.op1)?;
                    self.expr.op1 = self.expr.op2;
                    self.expr.y = self.expr.z.clone();
                    self.expr.op2 = Operator::Add;
                    self.expr.z = Operand::default();
                } else {
                    self.expr.x = combine(&self.expr.x, &self.expr.y, self.expr.op1)?;
                    // An equals right after a partial clear commits X and
                    // drops the pending right-hand side.
                    if self.clear_mode == ClearMode::Full {
                        self.expr.y = Operand::default();
                        self.expr.op1 = Operator::Add;
                        self.expr.z = Operand::default();
                        self.expr.op2 = Operator::Add;
                    }
                }
                self.expr.from_percent = false;
            }
            State::SetX => {}
            // Repeat equals re-applies the last operator against the stored
            // operands.
            State::Initial | State::SetOp1 | State::Equal => {
                self.expr.x = combine(&self.expr.x, &self.expr.y, self.expr.op1)?;
            }
        }
        self.expr.state = State::Equal;
        self.expr.slot = Slot::X;
        Ok(())
    }

    /// `C` / `AC`.
    fn clear(&mut self) {
        if self.clear_mode == ClearMode::Full {
            self.expr = Expression::default();
            return;
        }
        match self.expr.state {
            State::Initial => {
                self.expr = Expression::default();
            }
            State::SetX => {
                self.expr.x = Operand::default();
            }
            State::SetOp1 => {
                self.expr.state = State::SetX;
                self.expr.op1 = Operator::Add;
                self.expr.y = Operand::default();
                self.expr.start_new_operand = true;
            }
            State::SetY => {
                self.expr.y = self.expr.x.clone();
                self.expr.slot = Slot::Zero;
            }
            State::SetOp2 => {
                self.expr.state = State::SetY;
                self.expr.op2 = Operator::Add;
                self.expr.start_new_operand = true;
            }
            State::SetZ => {
                self.expr.z = Operand::default();
            }
            State::Equal => {
                self.expr.state = State::SetX;
                self.expr.y = self.expr.x.clone();
                self.expr.slot = Slot::Zero;
            }
        }
        self.clear_mode = ClearMode::Full;
    }

    /// `±`: toggle the sign of the live operand.
    fn negate(&mut self) {
        match self.expr.state {
            State::Initial => {}
            State::SetX => self.expr.x = self.expr.x.negated(),
            State::SetOp1 => {
                self.expr.state = State::SetY;
                self.expr.y = self.expr.y.negated();
                self.expr.slot = Slot::Y;
            }
            State::SetY => self.expr.y = self.expr.y.negated(),
            State::SetOp2 => {
                self.expr.state = State::SetZ;
                self.expr.z = self.expr.y.negated();
                self.expr.slot = Slot::Z;
                self.expr.start_new_operand = true;
            }
            State::SetZ => self.expr.z = self.expr.z.negated(),
            State::Equal => self.expr.x = self.expr.x.negated(),
        }
    }

    /// `%`: divide the live operand by 100, or mid-expression take a
    /// percentage of the committed left operand (so `50 + 10 %` stages 5,
    /// ten percent of fifty, not 0.1).
    fn percent(&mut self) -> Result<(), EngineError> {
        match self.expr.state {
            State::Initial => {}
            State::SetX => {
                self.expr.x = self.expr.x.percent();
                self.expr.start_new_operand = true;
            }
            State::SetOp1 => {
                self.expr.y = if self.expr.op1.is_multiplicative() {
                    self.expr.x.percent()
                } else {
                    combine(&self.expr.x, &self.expr.x.percent(), Operator::Multiply)?
                };
                self.expr.state = State::SetY;
                self.expr.slot = Slot::Y;
            }
            State::SetY => {
                self.expr.y = if self.expr.op1.is_multiplicative() {
                    self.expr.y.percent()
                } else {
                    combine(&self.expr.x, &self.expr.y.percent(), Operator::Multiply)?
                };
                self.expr.start_new_operand = true;
            }
            State::SetOp2 => {
                let staged = self.expr.y.percent();
                self.expr.y = combine(&self.expr.y, &staged, self.expr.op2)?;
                self.expr.z = staged;
                self.expr.state = State::SetY;
                self.expr.slot = Slot::Z;
                self.expr.from_percent = true;
            }
            State::SetZ => self.expr.z = self.expr.z.percent(),
            State::Equal => self.expr.x = self.expr.x.percent(),
        }
        Ok(())
    }

    fn notify(&self) {
        if let Some(on_display) = &self.on_display {
            on_display(&self.display_value());
        }
        if let Some(on_clear_label) = &self.on_clear_label {
            on_clear_label(self.clear_mode.label());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::input::parse_line;

    fn press(engine: &mut Engine, keys: &str) {
        for input in parse_line(keys) {
            engine.handle_input(input);
        }
    }

    fn run(keys: &str) -> Engine {
        let mut engine = Engine::new();
        press(&mut engine, keys);
        engine
    }

    #[test]
    fn test_single_addition() {
        let engine = run("5 + 3 =");
        assert_eq!(engine.display_value(), "8");
        assert_eq!(engine.expression().state, State::Equal);
        assert_eq!(engine.expression().x.text(), "8");
    }

    #[test]
    fn test_chained_addition_reduces_left_to_right() {
        let engine = run("5 + 3 + 2 =");
        assert_eq!(engine.expression().x.text(), "10");
        assert_eq!(engine.display_value(), "10");
    }

    #[test]
    fn test_intermediate_result_shown_when_chaining() {
        // The running total appears as soon as the second + is pressed.
        let engine = run("5 + 3 +");
        assert_eq!(engine.display_value(), "8");
        assert_eq!(engine.expression().state, State::SetOp1);
    }

    #[test]
    fn test_multiplicative_chain_folds_immediately() {
        let engine = run("2 * 3 * 4 =");
        assert_eq!(engine.display_value(), "24");

        // The fold is visible mid-chain.
        let engine = run("2 * 3 *");
        assert_eq!(engine.display_value(), "6");
        assert_eq!(engine.expression().state, State::SetOp1);
    }

    #[test]
    fn test_multiplicative_after_additive_is_deferred() {
        // 2 + 3 * 4 evaluates the multiplication first.
        let engine = run("2 + 3 * 4 =");
        assert_eq!(engine.display_value(), "14");
    }

    #[test]
    fn test_additive_press_reduces_full_window() {
        let mut engine = run("2 + 3 * 4 +");
        assert_eq!(engine.display_value(), "14");
        assert_eq!(engine.expression().state, State::SetOp1);
        press(&mut engine, "1 =");
        assert_eq!(engine.display_value(), "15");
    }

    #[test]
    fn test_pending_divide_after_folded_chain() {
        // 5 * 0 / : the multiplicative chain folds to 0 and the divide is
        // staged; nothing divides by zero until an operand or equals arrives.
        let engine = run("5 * 0 /");
        assert!(!engine.is_error());
        assert_eq!(engine.expression().state, State::SetOp1);
        assert_eq!(engine.expression().op1, Operator::Divide);
        assert_eq!(engine.display_value(), "0");
    }

    #[test]
    fn test_operator_override_before_second_operand() {
        let engine = run("5 + * 2 =");
        assert_eq!(engine.display_value(), "10");
    }

    #[test]
    fn test_last_staged_multiplicative_operator_wins() {
        let engine = run("8 + 2 * / 4 =");
        // The staged * is overwritten by /: 8 + 2/4.
        assert_eq!(engine.display_value(), "8.5");
    }

    #[test]
    fn test_division_by_zero_shows_sentinel_and_resets() {
        let mut engine = run("8 / 0 =");
        assert!(engine.is_error());
        assert_eq!(engine.display_value(), NOT_A_NUMBER);
        assert_eq!(engine.expression().state, State::Initial);

        // Operators are suppressed while the sentinel is showing.
        press(&mut engine, "+ =");
        assert!(engine.is_error());
        assert_eq!(engine.display_value(), NOT_A_NUMBER);

        // A digit starts a fresh calculation.
        press(&mut engine, "5");
        assert!(!engine.is_error());
        assert_eq!(engine.display_value(), "5");
        assert_eq!(engine.expression().state, State::SetX);
    }

    #[test]
    fn test_division_by_zero_mid_chain() {
        let engine = run("8 / 0 +");
        assert!(engine.is_error());
        assert_eq!(engine.display_value(), NOT_A_NUMBER);
    }

    #[test]
    fn test_percent_of_committed_operand() {
        // 50 + 10 % means "add ten percent of fifty".
        let engine = run("50 + 10 %");
        assert_eq!(engine.expression().y.text(), "5");
        assert_eq!(engine.display_value(), "5");

        let engine = run("50 + 10 % =");
        assert_eq!(engine.display_value(), "55");
    }

    #[test]
    fn test_percent_under_multiplicative_operator_is_bare() {
        // 50 * 10 % means "fifty times 0.1".
        let engine = run("50 * 10 % =");
        assert_eq!(engine.display_value(), "5");
    }

    #[test]
    fn test_percent_alone_divides_by_hundred() {
        let engine = run("50 %");
        assert_eq!(engine.display_value(), "0.5");

        // The next digit starts a fresh operand.
        let engine = run("50 % 7");
        assert_eq!(engine.display_value(), "7");
    }

    #[test]
    fn test_percent_with_staged_second_operator() {
        // 50 + 10 * % stages ten percent of ten, pre-folds y and the
        // following equals commits without double-counting.
        let mut engine = run("50 + 10 * %");
        assert_eq!(engine.display_value(), "0.1");
        press(&mut engine, "=");
        assert_eq!(engine.display_value(), "51");
    }

    #[test]
    fn test_repeat_equals_reapplies_last_operator() {
        let mut engine = run("5 + 3 =");
        assert_eq!(engine.display_value(), "8");
        press(&mut engine, "=");
        assert_eq!(engine.display_value(), "11");
        press(&mut engine, "=");
        assert_eq!(engine.display_value(), "14");
    }

    #[test]
    fn test_equals_right_after_operator_doubles() {
        let engine = run("5 + =");
        assert_eq!(engine.display_value(), "10");
    }

    #[test]
    fn test_digit_entry_round_trip() {
        let mut engine = run("1 2 . 5");
        assert_eq!(engine.display_value(), "12.5");
        // A second decimal point is ignored.
        press(&mut engine, ".");
        assert_eq!(engine.display_value(), "12.5");
    }

    #[test]
    fn test_readout_grouping() {
        let engine = run("1234567");
        assert_eq!(engine.display_value(), "1,234,567");

        let engine = run("1000.5");
        assert_eq!(engine.display_value(), "1,000.5");
    }

    #[test]
    fn test_clear_label_tracks_input() {
        let mut engine = Engine::new();
        assert_eq!(engine.clear_label(), "C");
        press(&mut engine, "5");
        assert_eq!(engine.clear_label(), "C");
        press(&mut engine, "c");
        assert_eq!(engine.clear_label(), "AC");
        press(&mut engine, "7");
        assert_eq!(engine.clear_label(), "C");
    }

    #[test]
    fn test_full_clear_is_idempotent() {
        let mut engine = run("5 + 3 * 2 c c");
        assert_eq!(*engine.expression(), Expression::default());
        assert_eq!(engine.clear_label(), "AC");
        press(&mut engine, "c");
        assert_eq!(*engine.expression(), Expression::default());
        assert_eq!(engine.display_value(), "0");
    }

    #[test]
    fn test_partial_clear_shows_zero_sentinel() {
        let mut engine = run("5 + 3 c");
        assert_eq!(engine.display_value(), "0");
        assert_eq!(engine.expression().slot, Slot::Zero);
        assert_eq!(engine.clear_label(), "AC");

        // Typing resumes the second operand from scratch.
        press(&mut engine, "7 =");
        assert_eq!(engine.display_value(), "7");
    }

    #[test]
    fn test_partial_clear_backs_out_staged_operator() {
        let mut engine = run("5 + c");
        assert_eq!(engine.expression().state, State::SetX);
        assert_eq!(engine.expression().op1, Operator::Add);
        // The next digit replaces the stale first operand.
        press(&mut engine, "7 =");
        assert_eq!(engine.display_value(), "7");
    }

    #[test]
    fn test_partial_clear_of_third_operand() {
        let mut engine = run("2 + 3 * 4 c");
        assert_eq!(engine.expression().z.text(), "0");
        assert_eq!(engine.expression().state, State::SetZ);
        press(&mut engine, "5 =");
        assert_eq!(engine.display_value(), "17");
    }

    #[test]
    fn test_negation_toggles_live_operand() {
        let mut engine = run("5 n");
        assert_eq!(engine.display_value(), "-5");
        press(&mut engine, "n");
        assert_eq!(engine.display_value(), "5");
    }

    #[test]
    fn test_negation_after_operator_targets_promoted_operand() {
        let engine = run("5 + n");
        assert_eq!(engine.expression().state, State::SetY);
        assert_eq!(engine.display_value(), "-5");
    }

    #[test]
    fn test_negation_with_staged_second_operator() {
        let engine = run("5 + 3 * n");
        assert_eq!(engine.expression().state, State::SetZ);
        assert_eq!(engine.display_value(), "-3");
    }

    #[test]
    fn test_negation_is_noop_before_input() {
        let engine = run("n");
        assert_eq!(*engine.expression(), Expression::default());
    }

    #[test]
    fn test_new_calculation_after_equals() {
        let mut engine = run("5 + 3 =");
        press(&mut engine, "4 2");
        assert_eq!(engine.display_value(), "42");
        assert_eq!(engine.expression().state, State::SetX);
        press(&mut engine, "- 2 =");
        assert_eq!(engine.display_value(), "40");
    }

    #[test]
    fn test_result_feeds_next_calculation() {
        let engine = run("5 + 3 = * 2 =");
        assert_eq!(engine.display_value(), "16");
    }

    #[test]
    fn test_sinks_receive_readout_and_label() {
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let labels: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let mut engine = Engine::new();
        let sink = Arc::clone(&seen);
        engine.set_on_display(move |readout| sink.lock().unwrap().push(readout.to_string()));
        let sink = Arc::clone(&labels);
        engine.set_on_clear_label(move |label| sink.lock().unwrap().push(label.to_string()));

        press(&mut engine, "5 + 3 =");
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["5".to_string(), "5".to_string(), "3".to_string(), "8".to_string()]
        );
        assert_eq!(labels.lock().unwrap().last().map(String::as_str), Some("C"));
    }
}
