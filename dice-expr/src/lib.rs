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

pub mod dice_types;

#[cfg(feature = "roll")]
pub mod dice_roll;

pub mod limits;

#[cfg(feature = "parser")]
pub mod parser;

use std::collections::HashMap;
use thiserror::Error;

pub use dice_types::{
    DicePool, DiceTerm, DiceType, DieRoll, Expression, Function, Operation, RepeatExpression,
    Selector, Term,
};

/// Saved roll names mapped to their expression text. The caller merges user
/// and server scoped entries before handing the map to the parser; names are
/// expected in lowercase.
pub type SavedRolls = HashMap<String, String>;

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum ParserError {
    #[error("Invalid expression")]
    InvalidExpression,
    #[error("Mismatched parenthesis")]
    MismatchedParenthesis,
    #[error("Repeat must be the last operator if it is present and be followed by one term or expression")]
    RepeatMisplaced,
    #[error("Repeat may not appear more than once")]
    MultipleRepeat,
    #[error("Functions must be followed by an expression in parenthesis")]
    FunctionMisplaced,
    #[error("No saved roll matching {0}")]
    UnresolvedIdentifier(String),
    #[error("{0} is not a valid Integer")]
    InvalidInteger(String),
    #[error("Number of Dice cannot be 0")]
    ZeroDiceCount,
    #[error("Dice Rank cannot be 0")]
    ZeroDiceRank,
    #[error("Keep Count cannot be 0")]
    ZeroKeepCount,
    #[error("Saved roll {0} references itself")]
    CyclicSavedRoll(String),
    #[error("Invalid pool")]
    InvalidPool,
    #[error("Operators are not allowed in pools")]
    OperatorsNotAllowed,
    #[error("Only dice terms are allowed in pools")]
    OnlyDiceAllowed,
}
