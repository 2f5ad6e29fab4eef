use super::ast::FacetGrid;
use super::lexer::{identifier, ws};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::map,
    multi::separated_list1,
    sequence::preceded,
    IResult,
};

/// Parse `facet_grid(rows: col, cols: col)`; either key may be left out
pub fn parse_facet_grid(input: &str) -> IResult<&str, FacetGrid> {
    let (input, _) = ws(tag("facet_grid"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, args) = separated_list1(
        ws(char(',')),
        alt((
            map(preceded(ws(tag("rows:")), ws(identifier)), |v| ("rows", v)),
            map(preceded(ws(tag("cols:")), ws(identifier)), |v| ("cols", v)),
        )),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    let mut facet = FacetGrid::default();
    for (key, val) in args {
        match key {
            "rows" => facet.rows = Some(val),
            "cols" => facet.cols = Some(val),
            _ => {}
        }
    }

    Ok((input, facet))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_facet_grid() {
        let (_, facet) = parse_facet_grid("facet_grid(rows: Survived, cols: Sex)").unwrap();
        assert_eq!(facet.rows.as_deref(), Some("Survived"));
        assert_eq!(facet.cols.as_deref(), Some("Sex"));
    }

    #[test]
    fn test_parse_facet_grid_cols_only() {
        let (_, facet) = parse_facet_grid("facet_grid(cols: Sex)").unwrap();
        assert!(facet.rows.is_none());
    }

    #[test]
    fn test_parse_facet_grid_empty() {
        assert!(parse_facet_grid("facet_grid()").is_err());
    }
}
