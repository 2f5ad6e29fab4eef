use nom::{
    character::complete::char,
    bytes::complete::tag,
    multi::separated_list0,
    sequence::separated_pair,
    IResult,
};
use crate::parser::ast::Labels;
use crate::parser::lexer::{identifier, string_literal, ws};

/// Parse `labs(title: "...", Column: "Display name", ...)`
pub fn parse_labs(input: &str) -> IResult<&str, Labels> {
    let (input, _) = ws(tag("labs"))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, args) = separated_list0(
        ws(char(',')),
        separated_pair(ws(identifier), char(':'), ws(string_literal)),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    let mut labels = Labels::default();
    for (key, val) in args {
        if key == "title" {
            labels.title = Some(val);
        } else if let Some(existing) = labels.columns.iter_mut().find(|(c, _)| *c == key) {
            existing.1 = val;
        } else {
            labels.columns.push((key, val));
        }
    }

    Ok((input, labels))
}
