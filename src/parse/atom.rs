//! The atom token codec: a single SMILES atom, bracketed or not, into an [`Atom`].

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while_m_n},
    character::complete::{char, digit1, one_of, satisfy},
    combinator::{all_consuming, map, map_res, opt, recognize},
    error::{convert_error, VerboseError},
    multi::many0_count,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};
use tracing::*;

use super::SmilesError;
use crate::{Atom, Symbol};

type Res<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

/// The fields of a bracket atom, in the order they are written.
struct BracketAtom<'a> {
    isotope: Option<u32>,
    element: &'a str,
    stereo: Option<&'a str>,
    hcount: Option<u32>,
    charge: Option<i32>,
    class: Option<u32>,
}

fn number(input: &str) -> Res<u32> {
    map_res(digit1, str::parse)(input)
}

fn element(input: &str) -> Res<&str> {
    alt((
        tag("as"),
        tag("se"),
        recognize(one_of("bcnosp*")),
        recognize(pair(
            satisfy(|c| c.is_ascii_uppercase()),
            take_while_m_n(0, 2, |c: char| c.is_ascii_lowercase()),
        )),
    ))(input)
}

fn stereo(input: &str) -> Res<&str> {
    recognize(preceded(
        char('@'),
        opt(alt((
            tag("@"),
            recognize(pair(tag("TH"), one_of("12"))),
            recognize(pair(tag("AL"), one_of("12"))),
            recognize(pair(tag("SP"), one_of("123"))),
            recognize(pair(tag("OH"), take_while_m_n(1, 2, |c: char| c.is_ascii_digit()))),
            recognize(pair(tag("TB"), take_while_m_n(1, 2, |c: char| c.is_ascii_digit()))),
        ))),
    ))(input)
}

fn hcount(input: &str) -> Res<u32> {
    map(
        preceded(char('H'), opt(satisfy(|c| c.is_ascii_digit()))),
        |digit| digit.and_then(|d| d.to_digit(10)).unwrap_or(1),
    )(input)
}

/// `+`, `-`, a sign with a magnitude (`+2`) or repeated signs (`--`).
fn charge(input: &str) -> Res<i32> {
    let (input, sign) = one_of("+-")(input)?;
    let unit = if sign == '+' { 1 } else { -1 };
    let (input, magnitude) = alt((
        map_res(take_while_m_n(1, 2, |c: char| c.is_ascii_digit()), str::parse::<i32>),
        map(many0_count(char(sign)), |repeats| repeats as i32 + 1),
    ))(input)?;
    Ok((input, unit * magnitude))
}

fn class(input: &str) -> Res<u32> {
    preceded(char(':'), number)(input)
}

fn bracket_atom(input: &str) -> Res<BracketAtom> {
    map(
        delimited(
            char('['),
            tuple((opt(number), element, opt(stereo), opt(hcount), opt(charge), opt(class))),
            char(']'),
        ),
        |(isotope, element, stereo, hcount, charge, class)| BracketAtom {
            isotope,
            element,
            stereo,
            hcount,
            charge,
            class,
        },
    )(input)
}

/// Parse a single atom token such as `C`, `c`, `*` or `[13CH3-:2]`.
///
/// Unbracketed atoms leave `hcount` unknown; bracket atoms (and the bare
/// wildcard) state it, defaulting to 0. Stereochemistry is kept on the atom
/// but otherwise ignored.
pub fn parse_atom(token: &str) -> Result<Atom, SmilesError> {
    if !token.starts_with('[') && !token.ends_with(']') {
        if token == "*" {
            return Ok(Atom::wildcard().with_hcount(0));
        }
        if token.is_empty() || !token.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(SmilesError::MalformedAtom {
                token: token.to_string(),
                reason: "expected an element symbol".to_string(),
            });
        }
        return Ok(Atom {
            element: Some(Symbol::new(token)),
            aromatic: token.chars().all(|c| c.is_ascii_lowercase()),
            ..Default::default()
        });
    }

    let parsed = match all_consuming(bracket_atom)(token) {
        Ok((_, parsed)) => parsed,
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            return Err(SmilesError::MalformedAtom {
                token: token.to_string(),
                reason: convert_error(token, e),
            })
        }
        Err(nom::Err::Incomplete(_)) => {
            return Err(SmilesError::MalformedAtom {
                token: token.to_string(),
                reason: "incomplete".to_string(),
            })
        }
    };

    let aromatic = parsed.element.starts_with(|c: char| c.is_ascii_lowercase());
    let atom = Atom {
        element: (parsed.element != "*").then(|| Symbol::new(parsed.element)),
        charge: parsed.charge.unwrap_or(0),
        hcount: Some(parsed.hcount.unwrap_or(0)),
        aromatic,
        isotope: parsed.isotope,
        class: parsed.class,
        stereo: parsed.stereo.map(str::to_string),
    };

    if atom.is_hydrogen() && atom.hcount.unwrap_or(0) > 0 {
        return Err(SmilesError::HydrogenWithHydrogens(token.to_string()));
    }
    if atom.stereo.is_some() {
        warn!("Atom {token:?} contains stereochemical information that will be discarded");
    }
    Ok(atom)
}
