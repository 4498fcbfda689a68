//! SQL Parser
//!
//! Parses SQL statement strings into a [`Query`] AST.
//!
//! # Supported Syntax
//!
//! ```text
//! SELECT * | item [, item ...]
//! FROM '<bucket key>'
//! [WHERE column op number [AND column op number ...]]
//! [LIMIT n]
//!
//! item := column [AS alias] | AGG(column | *) [AS alias]
//! op   := = | == | != | <> | > | >= | < | <=
//! ```
//!
//! # Examples
//!
//! ```text
//! SELECT * FROM 'AAPL/1Min/OHLCV'
//! SELECT Epoch, Close FROM 'AAPL/1Min/OHLCV' WHERE Epoch >= 1700000000 AND Close > 10
//! SELECT AVG(Close) AS mean FROM 'AAPL/1D/OHLCV' LIMIT 20
//! ```

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while, take_while1},
    character::complete::{char, digit1, multispace0, multispace1},
    combinator::{map_res, opt, recognize, value},
    multi::separated_list1,
    sequence::{delimited, pair, tuple},
    IResult,
};

use crate::query::ast::*;
use crate::query::error::{QueryError, QueryResult};

/// Parse a statement string into a Query AST
pub fn parse_query(input: &str) -> QueryResult<Query> {
    let input = input.trim();

    match parse_full_query(input) {
        Ok((remaining, query)) => {
            if remaining.trim().is_empty() {
                Ok(query)
            } else {
                Err(QueryError::Parse(format!(
                    "Unexpected input after query: '{}'",
                    remaining.trim()
                )))
            }
        }
        Err(e) => Err(QueryError::Parse(format!("Parse error: {:?}", e))),
    }
}

/// Parse the full statement
fn parse_full_query(input: &str) -> IResult<&str, Query> {
    let (input, _) = multispace0(input)?;
    let (input, select) = parse_select_clause(input)?;
    let (input, _) = multispace1(input)?;
    let (input, from) = parse_from_clause(input)?;
    let (input, _) = multispace0(input)?;
    let (input, filters) = opt(parse_where_clause)(input)?;
    let (input, _) = multispace0(input)?;
    let (input, limit) = opt(parse_limit_clause)(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = opt(char(';'))(input)?;

    Ok((
        input,
        Query {
            select,
            from,
            filters: filters.unwrap_or_default(),
            limit,
        },
    ))
}

/// Parse SELECT clause
fn parse_select_clause(input: &str) -> IResult<&str, Vec<SelectItem>> {
    let (input, _) = tag_no_case("SELECT")(input)?;
    let (input, _) = multispace1(input)?;

    // Handle SELECT *
    if let Ok((input, _)) = char::<&str, nom::error::Error<&str>>('*')(input) {
        return Ok((input, vec![SelectItem::new(WILDCARD)]));
    }

    separated_list1(
        delimited(multispace0, char(','), multispace0),
        parse_select_item,
    )(input)
}

/// Parse a single SELECT item (column or aggregated column)
fn parse_select_item(input: &str) -> IResult<&str, SelectItem> {
    alt((parse_aggregated_item, parse_simple_item))(input)
}

/// Parse an aggregated item like AVG(Close)
fn parse_aggregated_item(input: &str) -> IResult<&str, SelectItem> {
    let (input, agg) = parse_aggregation_func(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char('(')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, column) = alt((tag(WILDCARD), parse_identifier))(input)?;
    let (input, _) = multispace0(input)?;
    let (input, _) = char(')')(input)?;
    let (input, alias) = opt(parse_alias)(input)?;

    let item = SelectItem::new(column).with_aggregation(agg);
    Ok((input, with_optional_alias(item, alias)))
}

/// Parse a plain column item
fn parse_simple_item(input: &str) -> IResult<&str, SelectItem> {
    let (input, column) = parse_identifier(input)?;
    let (input, alias) = opt(parse_alias)(input)?;

    Ok((input, with_optional_alias(SelectItem::new(column), alias)))
}

fn with_optional_alias(item: SelectItem, alias: Option<String>) -> SelectItem {
    match alias {
        Some(alias) => item.with_alias(alias),
        None => item,
    }
}

/// Parse AS alias clause
fn parse_alias(input: &str) -> IResult<&str, String> {
    let (input, _) = multispace1(input)?;
    let (input, _) = tag_no_case("AS")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, alias) = parse_identifier(input)?;
    Ok((input, alias.to_string()))
}

/// Parse aggregation function name
fn parse_aggregation_func(input: &str) -> IResult<&str, AggregationFunc> {
    alt((
        value(AggregationFunc::Avg, alt((tag_no_case("AVERAGE"), tag_no_case("AVG")))),
        value(AggregationFunc::Sum, tag_no_case("SUM")),
        value(AggregationFunc::Min, tag_no_case("MIN")),
        value(AggregationFunc::Max, tag_no_case("MAX")),
        value(AggregationFunc::Count, tag_no_case("COUNT")),
        value(AggregationFunc::Last, tag_no_case("LAST")),
        value(AggregationFunc::First, tag_no_case("FIRST")),
    ))(input)
}

/// Parse FROM clause; the key may be quoted or bare
fn parse_from_clause(input: &str) -> IResult<&str, String> {
    let (input, _) = tag_no_case("FROM")(input)?;
    let (input, _) = multispace1(input)?;
    alt((parse_quoted_string, parse_bare_key))(input)
}

/// Parse an unquoted bucket key
fn parse_bare_key(input: &str) -> IResult<&str, String> {
    let (input, key) = take_while1(|c: char| !c.is_whitespace() && c != ';')(input)?;
    Ok((input, key.to_string()))
}

/// Parse WHERE clause
fn parse_where_clause(input: &str) -> IResult<&str, Vec<Filter>> {
    let (input, _) = tag_no_case("WHERE")(input)?;
    let (input, _) = multispace1(input)?;

    separated_list1(
        delimited(multispace0, tag_no_case("AND"), multispace1),
        parse_condition,
    )(input)
}

/// Parse a single condition like "Close > 10.5"
fn parse_condition(input: &str) -> IResult<&str, Filter> {
    let (input, column) = parse_identifier(input)?;
    let (input, _) = multispace0(input)?;
    let (input, op) = parse_operator(input)?;
    let (input, _) = multispace0(input)?;
    let (input, value) = parse_number(input)?;

    Ok((input, Filter::new(column, op, value)))
}

/// Parse LIMIT clause
fn parse_limit_clause(input: &str) -> IResult<&str, usize> {
    let (input, _) = tag_no_case("LIMIT")(input)?;
    let (input, _) = multispace1(input)?;
    map_res(digit1, |s: &str| s.parse::<usize>())(input)
}

/// Parse comparison operator
fn parse_operator(input: &str) -> IResult<&str, Operator> {
    alt((
        value(Operator::Gte, tag(">=")),
        value(Operator::Lte, tag("<=")),
        value(Operator::Ne, alt((tag("!="), tag("<>")))),
        value(Operator::Gt, tag(">")),
        value(Operator::Lt, tag("<")),
        value(Operator::Eq, alt((tag("=="), tag("=")))),
    ))(input)
}

/// Parse identifier (column name, alias)
fn parse_identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))(input)
}

/// Parse quoted string
fn parse_quoted_string(input: &str) -> IResult<&str, String> {
    let (input, _) = char('\'')(input)?;
    let (input, content) = take_while(|c| c != '\'')(input)?;
    let (input, _) = char('\'')(input)?;
    Ok((input, content.to_string()))
}

/// Parse floating point number
fn parse_number(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            opt(char('-')),
            digit1,
            opt(pair(char('.'), digit1)),
        ))),
        |s: &str| s.parse::<f64>(),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_select_star() {
        let query = parse_query("SELECT * FROM 'AAPL/1Min/OHLCV'").unwrap();
        assert_eq!(query.select.len(), 1);
        assert!(query.select[0].is_wildcard());
        assert_eq!(query.from, "AAPL/1Min/OHLCV");
        assert!(query.filters.is_empty());
        assert_eq!(query.limit, None);
    }

    #[test]
    fn test_parse_multiple_columns() {
        let query = parse_query("SELECT Epoch, Open, Close FROM AAPL/1Min/OHLCV").unwrap();
        assert_eq!(query.select.len(), 3);
        assert_eq!(query.select[1].column, "Open");
        assert_eq!(query.from, "AAPL/1Min/OHLCV");
    }

    #[test]
    fn test_parse_aggregated_select() {
        let query =
            parse_query("SELECT AVG(Close) AS mean, COUNT(*) FROM 'AAPL/1D/OHLCV'").unwrap();
        assert_eq!(query.select[0].aggregation, Some(AggregationFunc::Avg));
        assert_eq!(query.select[0].alias, Some("mean".to_string()));
        assert_eq!(query.select[1].aggregation, Some(AggregationFunc::Count));
        assert!(query.select[1].is_wildcard());
    }

    #[test]
    fn test_column_named_like_aggregate() {
        let query = parse_query("SELECT MAXVOL FROM 'AAPL/1D/OHLCV'").unwrap();
        assert_eq!(query.select[0].column, "MAXVOL");
        assert!(query.select[0].aggregation.is_none());
    }

    #[test]
    fn test_parse_where_and_limit() {
        let query = parse_query(
            "SELECT Close FROM 'AAPL/1Min/OHLCV' WHERE Epoch >= 120 AND Close < -1.5 LIMIT 10;",
        )
        .unwrap();
        assert_eq!(query.filters.len(), 2);
        assert_eq!(query.filters[0], Filter::new("Epoch", Operator::Gte, 120.0));
        assert_eq!(query.filters[1], Filter::new("Close", Operator::Lt, -1.5));
        assert_eq!(query.limit, Some(10));
    }

    #[test]
    fn test_parse_case_insensitive() {
        let query =
            parse_query("select avg(Close) from 'AAPL/1D/OHLCV' where Epoch > 0 limit 1").unwrap();
        assert_eq!(query.select[0].aggregation, Some(AggregationFunc::Avg));
        assert_eq!(query.limit, Some(1));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_query("INVALID Close").is_err());
        assert!(parse_query("SELECT Close").is_err());
        assert!(parse_query("SELECT Close FROM 'AAPL/1Min/OHLCV' ORDER BY Close").is_err());
        assert!(matches!(
            parse_query("SELECT Close FROM 'AAPL/1Min/OHLCV' WHERE Close > x"),
            Err(QueryError::Parse(_))
        ));
    }
}
