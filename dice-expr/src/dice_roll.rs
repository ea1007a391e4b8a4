/*
Copyright 2021 Robin Marchart

   Licensed under the Apache License, Version 2.0 (the "License");
   you may not use this file except in compliance with the License.
   You may obtain a copy of the License at

       http://www.apache.org/licenses/LICENSE-2.0

   Unless required by applicable law or agreed to in writing, software
   distributed under the License is distributed on an "AS IS" BASIS,
   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
   See the License for the specific language governing permissions and
   limitations under the License.
*/

use crate::{
    dice_types::{
        DicePool, DiceTerm, DiceType, DieRoll, Expression, Function, Operation, RepeatExpression,
        Selector, Term,
    },
    limits::DiceLimits,
};
use rand::{distributions::Uniform, Rng};
use std::convert::TryInto;
use thiserror::Error;

#[cfg(feature = "logging")]
use log::debug;

#[derive(Error, Debug, PartialEq, Eq, Clone, Copy)]
pub enum EvaluationErrors {
    #[error("Cannot divide by 0")]
    DivideByZero,
    #[error("Evaluation timed out")]
    Timeout,
    #[error("Overflow detected")]
    Overflow,
}

impl Operation {
    /// Applies the operation with checked integer arithmetic. Division and
    /// modulus use floor semantics: the quotient rounds toward negative
    /// infinity and the remainder takes the sign of the divisor.
    pub fn apply(&self, left: i64, right: i64) -> Result<i64, EvaluationErrors> {
        match self {
            Operation::Add => left.checked_add(right).ok_or(EvaluationErrors::Overflow),
            Operation::Sub => left.checked_sub(right).ok_or(EvaluationErrors::Overflow),
            Operation::Mul => left.checked_mul(right).ok_or(EvaluationErrors::Overflow),
            Operation::Div => {
                if right == 0 {
                    return Err(EvaluationErrors::DivideByZero);
                }
                let quotient = left.checked_div(right).ok_or(EvaluationErrors::Overflow)?;
                if left % right != 0 && (left < 0) != (right < 0) {
                    Ok(quotient - 1)
                } else {
                    Ok(quotient)
                }
            }
            Operation::Mod => {
                if right == 0 {
                    return Err(EvaluationErrors::DivideByZero);
                }
                let remainder = left.checked_rem(right).ok_or(EvaluationErrors::Overflow)?;
                if remainder != 0 && (remainder < 0) != (right < 0) {
                    Ok(remainder + right)
                } else {
                    Ok(remainder)
                }
            }
        }
    }
}

pub trait DiceEvaluate {
    fn evaluate<T: FnMut() -> bool, R: Rng>(
        &self,
        timeout_f: &mut T,
        rng: &mut R,
    ) -> Result<i64, EvaluationErrors>;
}

impl DiceTerm {
    fn roll_dice<T: FnMut() -> bool, R: Rng>(
        &self,
        timeout_f: &mut T,
        rng: &mut R,
    ) -> Result<Vec<DieRoll>, EvaluationErrors> {
        if timeout_f() {
            return Err(EvaluationErrors::Timeout);
        }
        let dist = match self.dice {
            DiceType::Number(faces) => Uniform::new_inclusive(1, i64::from(faces)),
            DiceType::Fudge => Uniform::new_inclusive(-1, 1),
        };
        let max_face = self.dice.max();
        let mut rolls: Vec<DieRoll> = Vec::with_capacity(
            self.throws
                .min(512)
                .try_into()
                .expect("failed to convert u32 to usize"),
        );
        let mut roll_counter: u8 = 0;
        let mut remaining = u64::from(self.throws);
        while remaining > 0 {
            let mut extra: u64 = 0;
            for _ in 0..remaining {
                roll_counter = roll_counter.wrapping_add(1);
                if roll_counter == 0 && timeout_f() {
                    return Err(EvaluationErrors::Timeout);
                }
                let value = rng.sample::<i64, _>(dist);
                let exploded = self.exploding && value == max_face;
                if exploded {
                    extra += 1;
                }
                rolls.push(DieRoll {
                    value,
                    exploded,
                    kept: true,
                });
            }
            remaining = extra;
        }
        if let Some((selector, keep)) = self.selector {
            let keep: usize = keep.try_into().expect("failed to convert u32 to usize");
            if keep < rolls.len() {
                let mut order: Vec<usize> = (0..rolls.len()).collect();
                order.sort_unstable_by_key(|index| rolls[*index].value);
                let dropped = match selector {
                    Selector::Higher => &order[..rolls.len() - keep],
                    Selector::Lower => &order[keep..],
                };
                for index in dropped {
                    rolls[*index].kept = false;
                }
            }
        }
        Ok(rolls)
    }
}

impl DiceEvaluate for DiceTerm {
    fn evaluate<T: FnMut() -> bool, R: Rng>(
        &self,
        timeout_f: &mut T,
        rng: &mut R,
    ) -> Result<i64, EvaluationErrors> {
        if self.rolls.borrow().is_none() {
            let rolled = self.roll_dice(timeout_f, rng)?;

            #[cfg(feature = "logging")]
            {
                debug!("Dice roll result for {} is {:?}", &self, &rolled);
            }

            *self.rolls.borrow_mut() = Some(rolled);
        }
        let rolls = self.rolls.borrow();
        rolls
            .as_ref()
            .expect("rolls were just filled")
            .iter()
            .filter(|roll| roll.kept)
            .try_fold(0i64, |sum, roll| sum.checked_add(roll.value))
            .ok_or(EvaluationErrors::Overflow)
    }
}

/// Theoretical value of a term as if every die had rolled its minimum,
/// maximum or truncated average face. Explosions are never simulated.
pub fn function_value(term: &Term, function: Function) -> Result<i64, EvaluationErrors> {
    match term {
        Term::Constant(value) => Ok(*value),
        Term::DiceThrow(dice) => Ok(match function {
            Function::Min => dice.min(),
            Function::Max => dice.max(),
            Function::Avg => dice.avg(),
        }),
        Term::Calculation(left, operation, right) => operation.apply(
            function_value(left, function)?,
            function_value(right, function)?,
        ),
        Term::Function(inner_function, inner) => function_value(inner, *inner_function),
    }
}

pub trait TermEvaluate {
    fn evaluate<T: FnMut() -> bool, R: Rng>(
        &self,
        timeout_f: &mut T,
        rng: &mut R,
    ) -> Result<i64, EvaluationErrors>;

    fn eval_and_print<T: FnMut() -> bool, R: Rng>(
        &self,
        timeout_f: &mut T,
        rng: &mut R,
    ) -> Result<String, EvaluationErrors>;
}

impl TermEvaluate for Term {
    fn evaluate<T: FnMut() -> bool, R: Rng>(
        &self,
        timeout_f: &mut T,
        rng: &mut R,
    ) -> Result<i64, EvaluationErrors> {
        let result = match self {
            Term::Constant(value) => Ok(*value),
            Term::DiceThrow(dice) => dice.evaluate(timeout_f, rng),
            Term::Calculation(left, operation, right) => {
                let left_value = left.evaluate(timeout_f, rng)?;
                let right_value = right.evaluate(timeout_f, rng)?;
                operation.apply(left_value, right_value)
            }
            Term::Function(function, inner) => function_value(inner, *function),
        };

        #[cfg(feature = "logging")]
        {
            debug!("got {:?} for term {}", &result, &self)
        }

        result
    }

    fn eval_and_print<T: FnMut() -> bool, R: Rng>(
        &self,
        timeout_f: &mut T,
        rng: &mut R,
    ) -> Result<String, EvaluationErrors> {
        let value = self.evaluate(timeout_f, rng)?;
        match self {
            Term::Constant(_) => Ok(value.to_string()),
            _ => Ok(format!("{} = {}", self.print_eval(), value)),
        }
    }
}

impl TermEvaluate for Box<Term> {
    fn evaluate<T: FnMut() -> bool, R: Rng>(
        &self,
        timeout_f: &mut T,
        rng: &mut R,
    ) -> Result<i64, EvaluationErrors> {
        self.as_ref().evaluate(timeout_f, rng)
    }

    fn eval_and_print<T: FnMut() -> bool, R: Rng>(
        &self,
        timeout_f: &mut T,
        rng: &mut R,
    ) -> Result<String, EvaluationErrors> {
        self.as_ref().eval_and_print(timeout_f, rng)
    }
}

impl RepeatExpression {
    fn realize<T: FnMut() -> bool, R: Rng>(
        &self,
        timeout_f: &mut T,
        rng: &mut R,
    ) -> Result<(), EvaluationErrors> {
        if self.repeated.borrow().is_some() {
            return Ok(());
        }
        let count = self.count.evaluate(timeout_f, rng)?;
        let size: usize = count.max(0).try_into().unwrap_or(usize::MAX);
        let mut clones: Vec<Term> = Vec::with_capacity(size.min(512));
        let mut roll_counter: u8 = 0;
        for _ in 0..size {
            roll_counter = roll_counter.wrapping_add(1);
            if roll_counter == 0 && timeout_f() {
                return Err(EvaluationErrors::Timeout);
            }
            clones.push(self.term.clone());
        }
        *self.repeated.borrow_mut() = Some(clones);
        Ok(())
    }

    pub fn evaluate<T: FnMut() -> bool, R: Rng>(
        &self,
        timeout_f: &mut T,
        rng: &mut R,
    ) -> Result<Vec<i64>, EvaluationErrors> {
        self.realize(timeout_f, rng)?;
        let repeated = self.repeated.borrow();
        let clones = repeated.as_ref().expect("repetitions were just realized");
        let mut results: Vec<i64> = Vec::with_capacity(clones.len());
        for clone in clones {
            results.push(clone.evaluate(timeout_f, rng)?);
        }
        Ok(results)
    }

    pub fn eval_and_print<T: FnMut() -> bool, R: Rng>(
        &self,
        timeout_f: &mut T,
        rng: &mut R,
    ) -> Result<String, EvaluationErrors> {
        let results = self.evaluate(timeout_f, rng)?;
        let count_text = self.count.eval_and_print(timeout_f, rng)?;
        let repeated = self.repeated.borrow();
        let clones = repeated
            .as_ref()
            .expect("repetitions were realized during evaluation");
        let mut lines = vec![format!("Repeating {} {} times", self.term, count_text)];
        for (clone, value) in clones.iter().zip(results.iter()) {
            lines.push(format!("{} = {}", clone.print_eval(), value));
        }
        Ok(lines.join("\n"))
    }
}

pub trait ExpressionEvaluate {
    fn evaluate<T: FnMut() -> bool, R: Rng>(
        &self,
        timeout_f: &mut T,
        rng: &mut R,
    ) -> Result<Vec<i64>, EvaluationErrors>;

    fn eval_and_print<T: FnMut() -> bool, R: Rng>(
        &self,
        timeout_f: &mut T,
        rng: &mut R,
    ) -> Result<String, EvaluationErrors>;
}

impl ExpressionEvaluate for Expression {
    fn evaluate<T: FnMut() -> bool, R: Rng>(
        &self,
        timeout_f: &mut T,
        rng: &mut R,
    ) -> Result<Vec<i64>, EvaluationErrors> {
        match self {
            Expression::Simple(term) => term.evaluate(timeout_f, rng).map(|result| vec![result]),
            Expression::Repeat(repeat) => repeat.evaluate(timeout_f, rng),
        }
    }

    fn eval_and_print<T: FnMut() -> bool, R: Rng>(
        &self,
        timeout_f: &mut T,
        rng: &mut R,
    ) -> Result<String, EvaluationErrors> {
        match self {
            Expression::Simple(term) => {
                let value = term.evaluate(timeout_f, rng)?;
                Ok(format!("{} = {}", term.print_eval(), value))
            }
            Expression::Repeat(repeat) => repeat.eval_and_print(timeout_f, rng),
        }
    }
}

impl ExpressionEvaluate for DicePool {
    fn evaluate<T: FnMut() -> bool, R: Rng>(
        &self,
        timeout_f: &mut T,
        rng: &mut R,
    ) -> Result<Vec<i64>, EvaluationErrors> {
        let mut results: Vec<i64> = Vec::with_capacity(self.pool.len());
        for term in &self.pool {
            results.push(term.evaluate(timeout_f, rng)?);
        }
        Ok(results)
    }

    fn eval_and_print<T: FnMut() -> bool, R: Rng>(
        &self,
        timeout_f: &mut T,
        rng: &mut R,
    ) -> Result<String, EvaluationErrors> {
        self.evaluate(timeout_f, rng)?;
        Ok(self.print_eval())
    }
}
