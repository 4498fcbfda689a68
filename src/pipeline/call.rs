//! Aggregate call tokenizer
//!
//! # Grammar
//!
//! ```text
//! call    := ws name ws '(' body ')' ws      ; first '(' and last ')'
//! body    := (literal | bare)*
//! literal := '\'' [^']* '\''
//! bare    := [^']+
//! ```
//!
//! Literals are collected left to right. The bare fragments are joined back
//! together verbatim, split on `,`, trimmed, and empty tokens dropped:
//!
//! ```text
//! EMA('5Min', Close)       →  name EMA, literals [5Min], params [Close]
//! Resample(Open,,'1H')     →  name Resample, literals [1H], params [Open]
//! ```

use crate::pipeline::error::{PipelineError, PipelineResult};
use nom::{
    branch::alt,
    bytes::complete::{is_not, take_while},
    character::complete::char,
    combinator::map,
    multi::many0,
    sequence::delimited,
    IResult,
};
use serde::Serialize;
use std::fmt;

/// One parsed aggregate invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateCall {
    pub name: String,
    /// Quoted init values, e.g. a period or timeframe
    pub literals: Vec<String>,
    /// Bare parameters, bound to the aggregate's argument map
    pub params: Vec<String>,
}

impl fmt::Display for AggregateCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self
            .literals
            .iter()
            .map(|l| format!("'{}'", l))
            .chain(self.params.iter().cloned())
            .collect();
        write!(f, "{}({})", self.name, args.join(", "))
    }
}

enum Fragment<'a> {
    Literal(&'a str),
    Bare(&'a str),
}

fn literal(input: &str) -> IResult<&str, &str> {
    delimited(char('\''), take_while(|c| c != '\''), char('\''))(input)
}

fn fragments(input: &str) -> IResult<&str, Vec<Fragment<'_>>> {
    many0(alt((
        map(literal, Fragment::Literal),
        map(is_not("'"), Fragment::Bare),
    )))(input)
}

/// Parse a call string such as `EMA('5Min', Close)`
pub fn parse_call(text: &str) -> PipelineResult<AggregateCall> {
    let call = text.trim();
    let (open, close) = match (call.find('('), call.rfind(')')) {
        (Some(open), Some(close)) if open < close => (open, close),
        _ => return Err(PipelineError::UnparsableCall(call.to_string())),
    };

    let name = call[..open].trim();
    if name.is_empty() {
        return Err(PipelineError::UnparsableCall(call.to_string()));
    }
    let body = &call[open + 1..close];

    let (rest, parts) =
        fragments(body).map_err(|_| PipelineError::UnparsableCall(call.to_string()))?;
    if let Some(unclosed) = rest.strip_prefix('\'') {
        return Err(PipelineError::UnclosedLiteral(unclosed.to_string()));
    }

    let mut literals = Vec::new();
    let mut bare = String::new();
    for part in parts {
        match part {
            Fragment::Literal(l) => literals.push(l.to_string()),
            Fragment::Bare(b) => bare.push_str(b),
        }
    }

    let params = bare
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    Ok(AggregateCall {
        name: name.to_string(),
        literals,
        params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_literal_and_param() {
        let call = parse_call("EMA('5Min', close)").unwrap();
        assert_eq!(call.name, "EMA");
        assert_eq!(call.literals, vec!["5Min"]);
        assert_eq!(call.params, vec!["close"]);
    }

    #[test]
    fn test_parse_surrounding_whitespace() {
        let call = parse_call("  Resample ( '1H' , Open, High,Low , Close )  ").unwrap();
        assert_eq!(call.name, "Resample");
        assert_eq!(call.literals, vec!["1H"]);
        assert_eq!(call.params, vec!["Open", "High", "Low", "Close"]);
    }

    #[test]
    fn test_parse_drops_empty_tokens() {
        let call = parse_call("Count(,, )").unwrap();
        assert!(call.params.is_empty());
        assert!(call.literals.is_empty());

        let call = parse_call("Avg()").unwrap();
        assert_eq!(call.name, "Avg");
        assert!(call.params.is_empty());
    }

    #[test]
    fn test_literal_inside_bare_text_joins_fragments() {
        let call = parse_call("F(a'x'b, c)").unwrap();
        assert_eq!(call.literals, vec!["x"]);
        assert_eq!(call.params, vec!["ab", "c"]);
    }

    #[test]
    fn test_parenthesis_framing_uses_last_close() {
        let call = parse_call("F('(a)', b)").unwrap();
        assert_eq!(call.literals, vec!["(a)"]);
        assert_eq!(call.params, vec!["b"]);
    }

    #[test]
    fn test_unclosed_literal() {
        let err = parse_call("EMA('5Min, close)").unwrap_err();
        assert!(matches!(err, PipelineError::UnclosedLiteral(_)));
    }

    #[test]
    fn test_unparsable_call() {
        for text in ["EMA", "EMA('5Min'", "EMA)(", "('5Min')"] {
            let err = parse_call(text).unwrap_err();
            assert!(matches!(err, PipelineError::UnparsableCall(_)), "{}", text);
            assert!(err.to_string().starts_with("unable to parse function call"));
        }
    }

    #[test]
    fn test_display() {
        let call = parse_call("EMA('5', Close)").unwrap();
        assert_eq!(call.to_string(), "EMA('5', Close)");
    }
}
