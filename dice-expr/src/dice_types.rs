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

use std::cell::RefCell;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ParserError;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DiceType {
    Number(u32),
    Fudge,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Selector {
    Higher,
    Lower,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Function {
    Min,
    Max,
    Avg,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Operation {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
}

/// One realized die from evaluating a [DiceTerm].
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DieRoll {
    pub value: i64,
    pub exploded: bool,
    pub kept: bool,
}

#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiceTerm {
    pub throws: u32,
    pub dice: DiceType,
    pub selector: Option<(Selector, u32)>,
    pub exploding: bool,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) rolls: RefCell<Option<Vec<DieRoll>>>,
}

impl DiceTerm {
    pub fn new(
        throws: u32,
        dice: DiceType,
        selector: Option<(Selector, u32)>,
        exploding: bool,
    ) -> DiceTerm {
        DiceTerm {
            throws,
            dice,
            selector,
            exploding,
            rolls: RefCell::new(None),
        }
    }

    pub fn validate(&self) -> Result<(), ParserError> {
        if self.throws == 0 {
            return Err(ParserError::ZeroDiceCount);
        }
        if let DiceType::Number(0) = self.dice {
            return Err(ParserError::ZeroDiceRank);
        }
        if let Some((_, 0)) = self.selector {
            return Err(ParserError::ZeroKeepCount);
        }
        Ok(())
    }

    /// Whether this term has already been rolled and therefore memoized its
    /// results.
    pub fn rolled(&self) -> bool {
        self.rolls.borrow().is_some()
    }

    pub fn roll_results(&self) -> Option<Vec<DieRoll>> {
        self.rolls.borrow().clone()
    }

    pub fn print_eval(&self) -> String {
        match self.rolls.borrow().as_ref() {
            None => self.to_string(),
            Some(rolls) => {
                let faces: Vec<String> = rolls.iter().map(|roll| self.format_roll(roll)).collect();
                match self.dice {
                    DiceType::Number(_) => format!("{}[{}]", self, faces.join(" + ")),
                    DiceType::Fudge => format!("{}[{}]", self, faces.join(" ")),
                }
            }
        }
    }

    fn format_roll(&self, roll: &DieRoll) -> String {
        let mut face = match self.dice {
            DiceType::Number(_) => roll.value.to_string(),
            DiceType::Fudge => match roll.value {
                value if value < 0 => "-".to_string(),
                0 => "0".to_string(),
                _ => "+".to_string(),
            },
        };
        if roll.exploded {
            face.push('!');
        }
        if self.selector.is_some() && roll.kept {
            face = format!("*{}*", face);
        }
        face
    }
}

impl Clone for DiceTerm {
    fn clone(&self) -> DiceTerm {
        // a clone is an unrolled copy, never sharing the original's results
        DiceTerm::new(self.throws, self.dice, self.selector, self.exploding)
    }
}

impl PartialEq for DiceTerm {
    fn eq(&self, other: &DiceTerm) -> bool {
        self.throws == other.throws
            && self.dice == other.dice
            && self.selector == other.selector
            && self.exploding == other.exploding
    }
}

impl Eq for DiceTerm {}

impl fmt::Display for DiceTerm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}d{}", self.throws, self.dice)?;
        match self.selector {
            Some((Selector::Higher, keep)) => write!(f, "kh{}", keep)?,
            Some((Selector::Lower, keep)) => write!(f, "kl{}", keep)?,
            None => {}
        }
        if self.exploding {
            write!(f, "!")?;
        }
        Ok(())
    }
}

impl fmt::Display for DiceType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DiceType::Number(faces) => write!(f, "{}", faces),
            DiceType::Fudge => write!(f, "F"),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operation::Mul => write!(f, "*"),
            Operation::Div => write!(f, "/"),
            Operation::Mod => write!(f, "%"),
            Operation::Add => write!(f, "+"),
            Operation::Sub => write!(f, "-"),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Function::Min => write!(f, "Min"),
            Function::Max => write!(f, "Max"),
            Function::Avg => write!(f, "Avg"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Term {
    Constant(i64),
    DiceThrow(DiceTerm),
    Calculation(Box<Term>, Operation, Box<Term>),
    Function(Function, Box<Term>),
}

impl Term {
    pub fn validate(&self) -> Result<(), ParserError> {
        match self {
            Term::Constant(_) => Ok(()),
            Term::DiceThrow(dice) => dice.validate(),
            Term::Calculation(left, _, right) => {
                left.validate()?;
                right.validate()
            }
            Term::Function(_, inner) => inner.validate(),
        }
    }

    pub fn print_eval(&self) -> String {
        match self {
            Term::Constant(value) => value.to_string(),
            Term::DiceThrow(dice) => dice.print_eval(),
            Term::Calculation(left, operation, right) => format!(
                "({} {} {})",
                left.print_eval(),
                operation,
                right.print_eval()
            ),
            Term::Function(function, inner) => format!("{}({})", function, inner.print_eval()),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Term::Constant(value) => write!(f, "{}", value),
            Term::DiceThrow(dice) => write!(f, "{}", dice),
            Term::Calculation(left, operation, right) => {
                write!(f, "({} {} {})", left, operation, right)
            }
            Term::Function(function, inner) => write!(f, "{}({})", function, inner),
        }
    }
}

#[derive(Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RepeatExpression {
    pub count: Term,
    pub term: Term,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) repeated: RefCell<Option<Vec<Term>>>,
}

impl RepeatExpression {
    pub fn new(count: Term, term: Term) -> RepeatExpression {
        RepeatExpression {
            count,
            term,
            repeated: RefCell::new(None),
        }
    }

    pub fn validate(&self) -> Result<(), ParserError> {
        self.count.validate()?;
        self.term.validate()
    }

    pub fn print_eval(&self) -> String {
        format!("({}) Repeat {}", self.term.print_eval(), self.count.print_eval())
    }
}

impl Clone for RepeatExpression {
    fn clone(&self) -> RepeatExpression {
        RepeatExpression::new(self.count.clone(), self.term.clone())
    }
}

impl PartialEq for RepeatExpression {
    fn eq(&self, other: &RepeatExpression) -> bool {
        self.count == other.count && self.term == other.term
    }
}

impl Eq for RepeatExpression {}

impl fmt::Display for RepeatExpression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}) Repeat {}", self.term, self.count)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Expression {
    Simple(Term),
    Repeat(RepeatExpression),
}

impl Expression {
    pub fn validate(&self) -> Result<(), ParserError> {
        match self {
            Expression::Simple(term) => term.validate(),
            Expression::Repeat(repeat) => repeat.validate(),
        }
    }

    pub fn print_eval(&self) -> String {
        match self {
            Expression::Simple(term) => term.print_eval(),
            Expression::Repeat(repeat) => repeat.print_eval(),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::Simple(term) => write!(f, "{}", term),
            Expression::Repeat(repeat) => write!(f, "{}", repeat),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DicePool {
    pub pool: Vec<DiceTerm>,
}

impl DicePool {
    pub fn new(pool: Vec<DiceTerm>) -> DicePool {
        DicePool { pool }
    }

    pub fn validate(&self) -> Result<(), ParserError> {
        for term in &self.pool {
            term.validate()?;
        }
        Ok(())
    }

    pub fn print_eval(&self) -> String {
        self.pool
            .iter()
            .map(DiceTerm::print_eval)
            .collect::<Vec<String>>()
            .join(" ")
    }
}

impl fmt::Display for DicePool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let terms: Vec<String> = self.pool.iter().map(|term| term.to_string()).collect();
        write!(f, "{}", terms.join(", "))
    }
}
