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
        DicePool, DiceTerm, DiceType, Expression, Function, Operation, RepeatExpression, Selector,
        Term,
    },
    ParserError, SavedRolls,
};

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case},
    character::complete::digit1,
    combinator::{all_consuming, map, map_res, opt, success},
    sequence::{preceded, tuple},
    IResult,
};

pub fn parse_u32(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |s: &str| s.parse::<u32>())(input)
}

pub fn parse_dice_type(input: &str) -> IResult<&str, DiceType> {
    alt((
        map(parse_u32, DiceType::Number),
        map(tag_no_case("f"), |_| DiceType::Fudge),
    ))(input)
}

pub fn parse_selector(input: &str) -> IResult<&str, (Selector, u32)> {
    preceded(
        tag_no_case("k"),
        alt((
            map(preceded(tag_no_case("l"), parse_u32), |keep| {
                (Selector::Lower, keep)
            }),
            map(preceded(opt(tag_no_case("h")), parse_u32), |keep| {
                (Selector::Higher, keep)
            }),
        )),
    )(input)
}

pub fn parse_dice_term(input: &str) -> IResult<&str, DiceTerm> {
    map(
        tuple((
            alt((parse_u32, success(1))),
            preceded(tag_no_case("d"), parse_dice_type),
            opt(parse_selector),
            opt(tag("!")),
        )),
        |(throws, dice, selector, exploding)| {
            DiceTerm::new(throws, dice, selector, exploding.is_some())
        },
    )(input)
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Token {
    Operator(Operation),
    OpenParen,
    CloseParen,
    Repeat,
    Function(Function),
    Text(String),
}

const KEYWORDS: [&str; 4] = ["repeat", "min", "max", "avg"];

fn keyword_token(keyword: &str) -> Token {
    match keyword {
        "repeat" => Token::Repeat,
        "min" => Token::Function(Function::Min),
        "max" => Token::Function(Function::Max),
        _ => Token::Function(Function::Avg),
    }
}

fn operator_token(character: char) -> Option<Token> {
    match character {
        '+' => Some(Token::Operator(Operation::Add)),
        '-' => Some(Token::Operator(Operation::Sub)),
        '*' => Some(Token::Operator(Operation::Mul)),
        '/' => Some(Token::Operator(Operation::Div)),
        '%' => Some(Token::Operator(Operation::Mod)),
        '(' => Some(Token::OpenParen),
        ')' => Some(Token::CloseParen),
        _ => None,
    }
}

fn normalize(expression: &str) -> String {
    expression
        .chars()
        .filter(|character| !character.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

pub fn tokenize(expression: &str, saved_rolls: &SavedRolls) -> Result<Vec<Token>, ParserError> {
    let mut visited: Vec<String> = Vec::new();
    tokenize_normalized(&normalize(expression), saved_rolls, &mut visited)
}

fn tokenize_normalized(
    expression: &str,
    saved_rolls: &SavedRolls,
    visited: &mut Vec<String>,
) -> Result<Vec<Token>, ParserError> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut rest = expression;
    loop {
        let keyword_hit = KEYWORDS
            .iter()
            .filter_map(|keyword| rest.find(keyword).map(|at| (at, *keyword)))
            .min();
        match keyword_hit {
            Some((at, keyword)) => {
                tokenize_segment(&rest[..at], saved_rolls, visited, &mut tokens)?;
                tokens.push(keyword_token(keyword));
                rest = &rest[at + keyword.len()..];
            }
            None => {
                tokenize_segment(rest, saved_rolls, visited, &mut tokens)?;
                break;
            }
        }
    }
    Ok(tokens)
}

fn tokenize_segment(
    segment: &str,
    saved_rolls: &SavedRolls,
    visited: &mut Vec<String>,
    tokens: &mut Vec<Token>,
) -> Result<(), ParserError> {
    let mut start = 0;
    for (at, character) in segment.char_indices() {
        if let Some(token) = operator_token(character) {
            tokenize_fragment(&segment[start..at], saved_rolls, visited, tokens)?;
            tokens.push(token);
            start = at + character.len_utf8();
        }
    }
    tokenize_fragment(&segment[start..], saved_rolls, visited, tokens)
}

fn tokenize_fragment(
    fragment: &str,
    saved_rolls: &SavedRolls,
    visited: &mut Vec<String>,
    tokens: &mut Vec<Token>,
) -> Result<(), ParserError> {
    if fragment.is_empty() {
        return Ok(());
    }
    if fragment.chars().all(|character| character.is_ascii_alphabetic()) {
        if let Some(saved) = saved_rolls.get(fragment) {
            if visited.iter().any(|name| name == fragment) {
                return Err(ParserError::CyclicSavedRoll(fragment.to_string()));
            }
            visited.push(fragment.to_string());
            let expanded = tokenize_normalized(&normalize(saved), saved_rolls, visited)?;
            visited.pop();
            tokens.extend(expanded);
            return Ok(());
        }
    }
    tokens.push(Token::Text(fragment.to_string()));
    Ok(())
}

pub fn validate(tokens: &[Token]) -> Result<(), ParserError> {
    if tokens.is_empty() {
        return Err(ParserError::InvalidExpression);
    }
    if matches!(tokens.first(), Some(Token::Operator(_)))
        || matches!(tokens.last(), Some(Token::Operator(_)))
    {
        return Err(ParserError::InvalidExpression);
    }
    let open = tokens.iter().filter(|token| **token == Token::OpenParen).count();
    let close = tokens
        .iter()
        .filter(|token| **token == Token::CloseParen)
        .count();
    if open != close {
        return Err(ParserError::MismatchedParenthesis);
    }
    let repeats = tokens.iter().filter(|token| **token == Token::Repeat).count();
    if repeats > 0 && (tokens.len() < 2 || tokens[tokens.len() - 2] != Token::Repeat) {
        return Err(ParserError::RepeatMisplaced);
    }
    if repeats > 1 {
        return Err(ParserError::MultipleRepeat);
    }
    if matches!(tokens.last(), Some(Token::Function(_))) {
        return Err(ParserError::FunctionMisplaced);
    }

    let mut paren_depth: usize = 0;
    for (at, token) in tokens.iter().enumerate() {
        match token {
            Token::Function(_) => {
                if tokens.get(at + 1) != Some(&Token::OpenParen) {
                    return Err(ParserError::FunctionMisplaced);
                }
            }
            Token::Text(text) => {
                if text.chars().all(|character| character.is_ascii_alphabetic()) {
                    return Err(ParserError::UnresolvedIdentifier(text.clone()));
                }
            }
            Token::OpenParen => paren_depth += 1,
            Token::CloseParen => {
                if paren_depth == 0 {
                    return Err(ParserError::MismatchedParenthesis);
                }
                paren_depth -= 1;
            }
            _ => {}
        }
    }
    if paren_depth != 0 {
        return Err(ParserError::MismatchedParenthesis);
    }
    Ok(())
}

fn precedence(token: &Token) -> u8 {
    match token {
        Token::Operator(Operation::Add) | Token::Operator(Operation::Sub) => 1,
        Token::Operator(_) => 2,
        _ => 0,
    }
}

pub fn to_postfix(tokens: Vec<Token>) -> Vec<Token> {
    let mut oper_stack: Vec<Token> = Vec::new();
    let mut postfix: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        match token {
            Token::Operator(_) => {
                while let Some(top) = oper_stack.last() {
                    if precedence(&token) > precedence(top) {
                        break;
                    }
                    postfix.push(oper_stack.pop().expect("operator stack is not empty"));
                }
                oper_stack.push(token);
            }
            Token::OpenParen | Token::Repeat | Token::Function(_) => oper_stack.push(token),
            Token::CloseParen => {
                while oper_stack.last() != Some(&Token::OpenParen) {
                    postfix.push(oper_stack.pop().expect("parenthesis are balanced"));
                }
                oper_stack.pop();
                if matches!(oper_stack.last(), Some(Token::Function(_))) {
                    postfix.push(oper_stack.pop().expect("function keyword is on the stack"));
                }
            }
            Token::Text(_) => postfix.push(token),
        }
    }
    postfix.extend(oper_stack.into_iter().rev());
    postfix
}

fn build_term(text: &str) -> Result<Term, ParserError> {
    if let Ok((_, dice)) = all_consuming(parse_dice_term)(text) {
        return Ok(Term::DiceThrow(dice));
    }
    text.parse::<i64>()
        .map(Term::Constant)
        .map_err(|_| ParserError::InvalidInteger(text.to_string()))
}

pub fn build_expression(postfix: Vec<Token>) -> Result<Expression, ParserError> {
    let mut expr_stack: Vec<Term> = Vec::new();
    let mut repeat_count: Option<Term> = None;
    for token in postfix {
        match token {
            Token::Operator(operation) => {
                let right = expr_stack.pop().ok_or(ParserError::InvalidExpression)?;
                let left = expr_stack.pop().ok_or(ParserError::InvalidExpression)?;
                expr_stack.push(Term::Calculation(Box::new(left), operation, Box::new(right)));
            }
            Token::Repeat => {
                repeat_count = Some(expr_stack.pop().ok_or(ParserError::InvalidExpression)?);
            }
            Token::Function(function) => {
                let inner = expr_stack.pop().ok_or(ParserError::InvalidExpression)?;
                expr_stack.push(Term::Function(function, Box::new(inner)));
            }
            Token::Text(text) => expr_stack.push(build_term(&text)?),
            Token::OpenParen | Token::CloseParen => return Err(ParserError::InvalidExpression),
        }
    }
    let root = expr_stack.pop().ok_or(ParserError::InvalidExpression)?;
    if !expr_stack.is_empty() {
        return Err(ParserError::InvalidExpression);
    }
    Ok(match repeat_count {
        None => Expression::Simple(root),
        Some(count) => Expression::Repeat(RepeatExpression::new(count, root)),
    })
}

pub fn parse_expression(input: &str, saved_rolls: &SavedRolls) -> Result<Expression, ParserError> {
    let tokens = tokenize(input, saved_rolls)?;
    validate(&tokens)?;
    let expression = build_expression(to_postfix(tokens))?;
    expression.validate()?;
    Ok(expression)
}

fn pool_tokens(input: &str) -> Vec<String> {
    let lowered = input.to_lowercase();
    let mut tokens: Vec<String> = Vec::new();
    for part in lowered.split(',') {
        let mut start = 0;
        for (at, character) in part.char_indices() {
            if operator_token(character).is_some() {
                push_pool_token(&part[start..at], &mut tokens);
                tokens.push(part[at..at + character.len_utf8()].to_string());
                start = at + character.len_utf8();
            }
        }
        push_pool_token(&part[start..], &mut tokens);
    }
    tokens
}

fn push_pool_token(raw: &str, tokens: &mut Vec<String>) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        tokens.push(trimmed.to_string());
    }
}

pub fn parse_dice_pool(input: &str) -> Result<DicePool, ParserError> {
    let tokens = pool_tokens(input);
    if tokens.is_empty() {
        return Err(ParserError::InvalidPool);
    }
    if tokens
        .iter()
        .any(|token| token.chars().any(|character| operator_token(character).is_some()))
    {
        return Err(ParserError::OperatorsNotAllowed);
    }
    let mut terms: Vec<DiceTerm> = Vec::with_capacity(tokens.len());
    for token in &tokens {
        match all_consuming(parse_dice_term)(token.as_str()) {
            Ok((_, dice)) => terms.push(dice),
            Err(_) => return Err(ParserError::OnlyDiceAllowed),
        }
    }
    let pool = DicePool::new(terms);
    pool.validate()?;
    Ok(pool)
}

#[cfg(test)]
mod tests {

    use super::*;

    fn no_rolls() -> SavedRolls {
        SavedRolls::new()
    }

    #[test]
    fn test_parse_u32() {
        assert_eq!(parse_u32("1"), Ok(("", 1)));
        assert_eq!(parse_u32("6969"), Ok(("", 6969)));
        assert_eq!(parse_u32("0"), Ok(("", 0)));
        assert_eq!(parse_u32("0d6"), Ok(("d6", 0)));
        assert!(parse_u32("-1").is_err());
        assert!(parse_u32("").is_err());
    }

    #[test]
    fn test_parse_dice_type() {
        assert_eq!(parse_dice_type("6"), Ok(("", DiceType::Number(6))));
        assert_eq!(parse_dice_type("f"), Ok(("", DiceType::Fudge)));
        assert_eq!(parse_dice_type("F"), Ok(("", DiceType::Fudge)));
        assert!(parse_dice_type("x").is_err());
        assert!(parse_dice_type("").is_err());
    }

    #[test]
    fn test_parse_selector() {
        assert_eq!(parse_selector("kh2"), Ok(("", (Selector::Higher, 2))));
        assert_eq!(parse_selector("k2"), Ok(("", (Selector::Higher, 2))));
        assert_eq!(parse_selector("kl1"), Ok(("", (Selector::Lower, 1))));
        assert!(parse_selector("k").is_err());
        assert!(parse_selector("h2").is_err());
    }

    #[test]
    fn test_parse_dice_term() {
        assert_eq!(
            parse_dice_term("4d6"),
            Ok(("", DiceTerm::new(4, DiceType::Number(6), None, false)))
        );
        assert_eq!(
            parse_dice_term("d20"),
            Ok(("", DiceTerm::new(1, DiceType::Number(20), None, false)))
        );
        assert_eq!(
            parse_dice_term("4d6kh2!"),
            Ok((
                "",
                DiceTerm::new(4, DiceType::Number(6), Some((Selector::Higher, 2)), true)
            ))
        );
        assert_eq!(
            parse_dice_term("3d8kl1"),
            Ok((
                "",
                DiceTerm::new(3, DiceType::Number(8), Some((Selector::Lower, 1)), false)
            ))
        );
        assert_eq!(
            parse_dice_term("4df"),
            Ok(("", DiceTerm::new(4, DiceType::Fudge, None, false)))
        );
        assert_eq!(
            parse_dice_term("2d10!"),
            Ok(("", DiceTerm::new(2, DiceType::Number(10), None, true)))
        );
        assert_eq!(
            parse_dice_term("4d6k"),
            Ok(("k", DiceTerm::new(4, DiceType::Number(6), None, false)))
        );
        assert!(parse_dice_term("14").is_err());
        assert!(parse_dice_term("").is_err());
    }

    #[test]
    fn test_tokenize_simple() {
        assert_eq!(
            tokenize("4d6 + 14", &no_rolls()),
            Ok(vec![
                Token::Text("4d6".to_string()),
                Token::Operator(Operation::Add),
                Token::Text("14".to_string()),
            ])
        );
    }

    #[test]
    fn test_tokenize_keywords() {
        assert_eq!(
            tokenize("Max(4d6)", &no_rolls()),
            Ok(vec![
                Token::Function(Function::Max),
                Token::OpenParen,
                Token::Text("4d6".to_string()),
                Token::CloseParen,
            ])
        );
        assert_eq!(
            tokenize("1d20 REPEAT 3", &no_rolls()),
            Ok(vec![
                Token::Text("1d20".to_string()),
                Token::Repeat,
                Token::Text("3".to_string()),
            ])
        );
    }

    #[test]
    fn test_tokenize_expands_saved_rolls() {
        let mut rolls = SavedRolls::new();
        rolls.insert("adv".to_string(), "2d20kh1".to_string());
        assert_eq!(
            tokenize("adv + 1", &rolls),
            Ok(vec![
                Token::Text("2d20kh1".to_string()),
                Token::Operator(Operation::Add),
                Token::Text("1".to_string()),
            ])
        );
    }

    #[test]
    fn test_tokenize_expands_nested_saved_rolls() {
        let mut rolls = SavedRolls::new();
        rolls.insert("hit".to_string(), "adv + 5".to_string());
        rolls.insert("adv".to_string(), "2d20kh1".to_string());
        assert_eq!(
            tokenize("hit * 2", &rolls),
            Ok(vec![
                Token::Text("2d20kh1".to_string()),
                Token::Operator(Operation::Add),
                Token::Text("5".to_string()),
                Token::Operator(Operation::Mul),
                Token::Text("2".to_string()),
            ])
        );
    }

    #[test]
    fn test_tokenize_detects_cycles() {
        let mut rolls = SavedRolls::new();
        rolls.insert("a".to_string(), "b + 1".to_string());
        rolls.insert("b".to_string(), "a + 1".to_string());
        assert_eq!(
            tokenize("a", &rolls),
            Err(ParserError::CyclicSavedRoll("a".to_string()))
        );
        rolls.insert("loop".to_string(), "loop + 1".to_string());
        assert_eq!(
            tokenize("loop", &rolls),
            Err(ParserError::CyclicSavedRoll("loop".to_string()))
        );
    }

    #[test]
    fn test_validate_errors() {
        assert_eq!(
            parse_expression("", &no_rolls()),
            Err(ParserError::InvalidExpression)
        );
        assert_eq!(
            parse_expression("4d6 +", &no_rolls()),
            Err(ParserError::InvalidExpression)
        );
        assert_eq!(
            parse_expression("+ 4d6", &no_rolls()),
            Err(ParserError::InvalidExpression)
        );
        assert_eq!(
            parse_expression("(4d6", &no_rolls()),
            Err(ParserError::MismatchedParenthesis)
        );
        assert_eq!(
            parse_expression(")4d6(", &no_rolls()),
            Err(ParserError::MismatchedParenthesis)
        );
        assert_eq!(
            parse_expression("4d6 Repeat 3 Repeat 2", &no_rolls()),
            Err(ParserError::MultipleRepeat)
        );
        assert_eq!(
            parse_expression("4d6 Repeat 3 + 2", &no_rolls()),
            Err(ParserError::RepeatMisplaced)
        );
        assert_eq!(
            parse_expression("Min 4d6", &no_rolls()),
            Err(ParserError::FunctionMisplaced)
        );
        assert_eq!(
            parse_expression("4d6 Min", &no_rolls()),
            Err(ParserError::FunctionMisplaced)
        );
        assert_eq!(
            parse_expression("fireball + 2", &no_rolls()),
            Err(ParserError::UnresolvedIdentifier("fireball".to_string()))
        );
        assert_eq!(
            parse_expression("4x + 1", &no_rolls()),
            Err(ParserError::InvalidInteger("4x".to_string()))
        );
    }

    #[test]
    fn test_zero_checks_happen_after_building() {
        assert_eq!(
            parse_expression("0d6", &no_rolls()),
            Err(ParserError::ZeroDiceCount)
        );
        assert_eq!(
            parse_expression("1d0", &no_rolls()),
            Err(ParserError::ZeroDiceRank)
        );
        assert_eq!(
            parse_expression("3d6kh0", &no_rolls()),
            Err(ParserError::ZeroKeepCount)
        );
    }

    #[test]
    fn test_build_simple_expression() {
        assert_eq!(
            parse_expression("4d6 + 14", &no_rolls()),
            Ok(Expression::Simple(Term::Calculation(
                Box::new(Term::DiceThrow(DiceTerm::new(
                    4,
                    DiceType::Number(6),
                    None,
                    false
                ))),
                Operation::Add,
                Box::new(Term::Constant(14)),
            )))
        );
    }

    #[test]
    fn test_build_honors_precedence() {
        assert_eq!(
            parse_expression("2 + 3 * 4", &no_rolls()),
            Ok(Expression::Simple(Term::Calculation(
                Box::new(Term::Constant(2)),
                Operation::Add,
                Box::new(Term::Calculation(
                    Box::new(Term::Constant(3)),
                    Operation::Mul,
                    Box::new(Term::Constant(4)),
                )),
            )))
        );
        // equal precedence is left associative
        assert_eq!(
            parse_expression("2 - 3 - 4", &no_rolls()),
            Ok(Expression::Simple(Term::Calculation(
                Box::new(Term::Calculation(
                    Box::new(Term::Constant(2)),
                    Operation::Sub,
                    Box::new(Term::Constant(3)),
                )),
                Operation::Sub,
                Box::new(Term::Constant(4)),
            )))
        );
    }

    #[test]
    fn test_build_parenthesis_override_precedence() {
        assert_eq!(
            parse_expression("(2 + 3) * 4", &no_rolls()),
            Ok(Expression::Simple(Term::Calculation(
                Box::new(Term::Calculation(
                    Box::new(Term::Constant(2)),
                    Operation::Add,
                    Box::new(Term::Constant(3)),
                )),
                Operation::Mul,
                Box::new(Term::Constant(4)),
            )))
        );
    }

    #[test]
    fn test_build_function_attaches_to_closed_group() {
        assert_eq!(
            parse_expression("Min(4d6) + 2", &no_rolls()),
            Ok(Expression::Simple(Term::Calculation(
                Box::new(Term::Function(
                    Function::Min,
                    Box::new(Term::DiceThrow(DiceTerm::new(
                        4,
                        DiceType::Number(6),
                        None,
                        false
                    ))),
                )),
                Operation::Add,
                Box::new(Term::Constant(2)),
            )))
        );
    }

    #[test]
    fn test_build_repeat_expression() {
        assert_eq!(
            parse_expression("2d6 + 1 Repeat 3", &no_rolls()),
            Ok(Expression::Repeat(RepeatExpression::new(
                Term::Constant(3),
                Term::Calculation(
                    Box::new(Term::DiceThrow(DiceTerm::new(
                        2,
                        DiceType::Number(6),
                        None,
                        false
                    ))),
                    Operation::Add,
                    Box::new(Term::Constant(1)),
                ),
            )))
        );
    }

    #[test]
    fn test_dangling_repeat_is_invalid() {
        assert_eq!(
            parse_expression("Repeat 3", &no_rolls()),
            Err(ParserError::InvalidExpression)
        );
    }

    #[test]
    fn test_juxtaposed_terms_are_invalid() {
        assert_eq!(
            parse_expression("(4d6)(3)", &no_rolls()),
            Err(ParserError::InvalidExpression)
        );
    }

    #[test]
    fn test_saved_roll_parses_like_inline_text() {
        let mut rolls = SavedRolls::new();
        rolls.insert("adv".to_string(), "2d20kh1".to_string());
        assert_eq!(
            parse_expression("(adv + 14) * 2", &rolls),
            parse_expression("(2d20kh1 + 14) * 2", &no_rolls())
        );
    }

    #[test]
    fn test_print_round_trip() {
        for input in &[
            "4d6 + 14",
            "4d6kh2!",
            "2 + 3 * 4",
            "(2 + 3) * 4",
            "Min((2d6 + 3))",
            "Max(4d6) % 5",
            "Avg(2d10)",
            "1d20 Repeat 3",
            "4dF - 1",
        ] {
            let expression = parse_expression(input, &no_rolls()).unwrap();
            let reparsed = parse_expression(&expression.to_string(), &no_rolls()).unwrap();
            assert_eq!(expression, reparsed);
        }
    }

    #[test]
    fn test_parse_full_expression() {
        assert_eq!(
            parse_expression("4d6k2! + 14 Repeat 3", &no_rolls()),
            Ok(Expression::Repeat(RepeatExpression::new(
                Term::Constant(3),
                Term::Calculation(
                    Box::new(Term::DiceThrow(DiceTerm::new(
                        4,
                        DiceType::Number(6),
                        Some((Selector::Higher, 2)),
                        true
                    ))),
                    Operation::Add,
                    Box::new(Term::Constant(14)),
                ),
            )))
        );
    }

    #[cfg(feature = "roll")]
    #[test]
    fn test_parse_and_evaluate() {
        use crate::dice_roll::{EvaluationErrors, ExpressionEvaluate};
        use rand::{rngs::StdRng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(11);

        let expression = parse_expression("2 + 3 * 4", &no_rolls()).unwrap();
        assert_eq!(expression.evaluate(&mut || false, &mut rng), Ok(vec![14]));

        let expression = parse_expression("7 / 2", &no_rolls()).unwrap();
        assert_eq!(expression.evaluate(&mut || false, &mut rng), Ok(vec![3]));

        let expression = parse_expression("7 % 2", &no_rolls()).unwrap();
        assert_eq!(expression.evaluate(&mut || false, &mut rng), Ok(vec![1]));

        let expression = parse_expression("1d6 / 0", &no_rolls()).unwrap();
        assert_eq!(
            expression.evaluate(&mut || false, &mut rng),
            Err(EvaluationErrors::DivideByZero)
        );

        let expression = parse_expression("Max(4d6)", &no_rolls()).unwrap();
        assert_eq!(expression.evaluate(&mut || false, &mut rng), Ok(vec![24]));
        let expression = parse_expression("Min(4d6)", &no_rolls()).unwrap();
        assert_eq!(expression.evaluate(&mut || false, &mut rng), Ok(vec![4]));
        let expression = parse_expression("Avg(4d6)", &no_rolls()).unwrap();
        assert_eq!(expression.evaluate(&mut || false, &mut rng), Ok(vec![14]));

        let expression = parse_expression("1d20 Repeat 3", &no_rolls()).unwrap();
        let results = expression.evaluate(&mut || false, &mut rng).unwrap();
        assert_eq!(results.len(), 3);
        for value in results {
            assert!(value >= 1 && value <= 20);
        }

        for k in 1u32..6 {
            let expression = parse_expression(&format!("{}d6", k), &no_rolls()).unwrap();
            let results = expression.evaluate(&mut || false, &mut rng).unwrap();
            assert!(results[0] >= i64::from(k) && results[0] <= 6 * i64::from(k));
        }
    }

    #[test]
    fn test_parse_dice_pool() {
        assert_eq!(
            parse_dice_pool("4d6, 3d8!, 2dF"),
            Ok(DicePool::new(vec![
                DiceTerm::new(4, DiceType::Number(6), None, false),
                DiceTerm::new(3, DiceType::Number(8), None, true),
                DiceTerm::new(2, DiceType::Fudge, None, false),
            ]))
        );
    }

    #[test]
    fn test_pool_errors() {
        assert_eq!(parse_dice_pool(""), Err(ParserError::InvalidPool));
        assert_eq!(parse_dice_pool(" , ,"), Err(ParserError::InvalidPool));
        assert_eq!(
            parse_dice_pool("4d6 + 2"),
            Err(ParserError::OperatorsNotAllowed)
        );
        assert_eq!(
            parse_dice_pool("(4d6)"),
            Err(ParserError::OperatorsNotAllowed)
        );
        assert_eq!(
            parse_dice_pool("4d6, 17"),
            Err(ParserError::OnlyDiceAllowed)
        );
        assert_eq!(
            parse_dice_pool("4d6, 0d8"),
            Err(ParserError::ZeroDiceCount)
        );
    }
}
