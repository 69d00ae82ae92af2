use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, digit1, one_of, space0},
    combinator::{all_consuming, map, map_res, opt, verify},
    sequence::{delimited, pair, preceded, terminated},
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{DiceError, Result},
    rules::dice::{DieType, Modifier, RollMode},
};

/// A parsed dice expression such as `3d6+2` or `d20 [adv]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollRequest {
    pub count: u32,
    pub die: DieType,
    pub modifier: i32,
    pub mode: RollMode,
}

impl RollRequest {
    /// The flat bonus as a modifier, or `None` when there is no bonus.
    pub fn modifier(&self) -> Option<Modifier> {
        (self.modifier != 0).then(|| Modifier::flat(self.modifier))
    }
}

pub fn parse_roll(input: &str) -> Result<RollRequest> {
    let res = all_consuming(delimited(space0, roll_request, space0)).parse(input);

    match res {
        Ok((_, request)) => Ok(request),
        Err(_) => Err(DiceError::invalid_argument(format!(
            "failed to parse roll {input:?}"
        ))),
    }
}

/// Parses a modifier expression: `+3`, `-2`, `*2` or `x2`.
pub fn parse_modifier(input: &str) -> Result<Modifier> {
    let res = all_consuming(delimited(space0, modifier_expr, space0)).parse(input);

    match res {
        Ok((_, (op, value))) => match op {
            '+' => Ok(Modifier::flat(value)),
            '-' => Ok(Modifier::flat(-value)),
            _ => Ok(Modifier::scale(value)),
        },
        Err(_) => Err(DiceError::invalid_argument(format!(
            "failed to parse modifier {input:?}"
        ))),
    }
}

fn number<T: std::str::FromStr>(input: &str) -> IResult<&str, T> {
    map_res(digit1, |s: &str| s.parse::<T>()).parse(input)
}

fn roll_request(input: &str) -> IResult<&str, RollRequest> {
    let (input, (count, die, modifier, mode)) = (
        opt(verify(number::<u32>, |&count| count >= 1)),
        preceded(one_of("dD"), map_res(number::<u32>, DieType::from_sides)),
        opt(preceded(
            space0,
            pair(alt((char('+'), char('-'))), preceded(space0, number::<i32>)),
        )),
        opt(preceded(space0, roll_mode)),
    )
        .parse(input)?;

    let modifier = match modifier {
        Some(('-', value)) => -value,
        Some((_, value)) => value,
        None => 0,
    };

    Ok((
        input,
        RollRequest {
            count: count.unwrap_or(1),
            die,
            modifier,
            mode: mode.unwrap_or_default(),
        },
    ))
}

fn roll_mode(input: &str) -> IResult<&str, RollMode> {
    delimited(
        terminated(char('['), space0),
        alt((
            map(tag_no_case("advantage"), |_| RollMode::Advantage),
            map(tag_no_case("adv"), |_| RollMode::Advantage),
            map(tag_no_case("disadvantage"), |_| RollMode::Disadvantage),
            map(tag_no_case("dis"), |_| RollMode::Disadvantage),
            map(tag_no_case("plain"), |_| RollMode::Plain),
        )),
        preceded(space0, char(']')),
    )
    .parse(input)
}

fn modifier_expr(input: &str) -> IResult<&str, (char, i32)> {
    pair(one_of("+-*x"), preceded(space0, number::<i32>)).parse(input)
}
