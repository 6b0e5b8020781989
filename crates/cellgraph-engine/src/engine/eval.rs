//! Two-stack infix evaluation.
//!
//! Walks the token sequence once, left to right, with an operand stack and an
//! operator stack local to the call. `*` and `/` are applied as soon as their
//! right operand is known; `+` and `-` are deferred until the next additive
//! operator, closing parenthesis, or the end of input.

use super::formula::Token;
use super::tokenizer::Operator;

/// Why evaluation stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalFault {
    UndefinedVariable(String),
    DivideByZero,
    EmptyExpression,
    /// Stack shape didn't match the grammar; unreachable for parsed formulas.
    Malformed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StackOp {
    LeftParen,
    Op(Operator),
}

struct Stacks {
    values: Vec<f64>,
    ops: Vec<StackOp>,
}

impl Stacks {
    fn top_is(&self, pred: impl Fn(Operator) -> bool) -> Option<Operator> {
        match self.ops.last() {
            Some(StackOp::Op(op)) if pred(*op) => Some(*op),
            _ => None,
        }
    }

    fn pop_value(&mut self) -> Result<f64, EvalFault> {
        self.values.pop().ok_or(EvalFault::Malformed)
    }

    /// Pop `op` and combine the value under the top with `rhs`.
    fn apply_with(&mut self, op: Operator, rhs: f64) -> Result<(), EvalFault> {
        self.ops.pop();
        let lhs = self.pop_value()?;
        self.values.push(combine(op, lhs, rhs)?);
        Ok(())
    }

    /// Pop `op` and combine the two topmost values.
    fn apply_top(&mut self, op: Operator) -> Result<(), EvalFault> {
        let rhs = self.pop_value()?;
        self.apply_with(op, rhs)
    }
}

fn is_additive(op: Operator) -> bool {
    matches!(op, Operator::Add | Operator::Sub)
}

fn is_multiplicative(op: Operator) -> bool {
    matches!(op, Operator::Mul | Operator::Div)
}

fn combine(op: Operator, lhs: f64, rhs: f64) -> Result<f64, EvalFault> {
    if op == Operator::Div && rhs == 0.0 {
        return Err(EvalFault::DivideByZero);
    }
    Ok(op.apply(lhs, rhs))
}

/// Evaluate a validated token sequence.
pub fn evaluate<F>(tokens: &[Token], lookup: F) -> Result<f64, EvalFault>
where
    F: Fn(&str) -> Option<f64>,
{
    if tokens.is_empty() {
        return Err(EvalFault::EmptyExpression);
    }

    let mut stacks = Stacks {
        values: Vec::new(),
        ops: Vec::new(),
    };

    for token in tokens {
        match token {
            Token::LeftParen => stacks.ops.push(StackOp::LeftParen),
            Token::Operator(op) if is_multiplicative(*op) => stacks.ops.push(StackOp::Op(*op)),
            Token::Operator(op) => {
                if let Some(pending) = stacks.top_is(is_additive) {
                    stacks.apply_top(pending)?;
                }
                stacks.ops.push(StackOp::Op(*op));
            }
            Token::Number { value, .. } => push_value(&mut stacks, *value)?,
            Token::Variable(name) => {
                let value =
                    lookup(name).ok_or_else(|| EvalFault::UndefinedVariable(name.clone()))?;
                push_value(&mut stacks, value)?;
            }
            Token::RightParen => {
                if let Some(pending) = stacks.top_is(is_additive) {
                    stacks.apply_top(pending)?;
                }
                if stacks.ops.pop() != Some(StackOp::LeftParen) {
                    return Err(EvalFault::Malformed);
                }
                if let Some(pending) = stacks.top_is(is_multiplicative) {
                    stacks.apply_top(pending)?;
                }
            }
        }
    }

    if stacks.ops.len() == 1
        && stacks.values.len() == 2
        && let Some(pending) = stacks.top_is(is_additive)
    {
        stacks.apply_top(pending)?;
    }

    match (stacks.values.as_slice(), stacks.ops.is_empty()) {
        ([result], true) => Ok(*result),
        _ => Err(EvalFault::Malformed),
    }
}

fn push_value(stacks: &mut Stacks, value: f64) -> Result<(), EvalFault> {
    match stacks.top_is(is_multiplicative) {
        Some(op) => stacks.apply_with(op, value),
        None => {
            stacks.values.push(value);
            Ok(())
        }
    }
}
