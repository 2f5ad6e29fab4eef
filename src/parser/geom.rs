// Geometry (geom) parser for chart recipes

use super::ast::{BarGeom, BarPosition, Geom, PieGeom, XyGeom};
use super::lexer::{identifier, string_literal, ws};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::map,
    error::{Error, ErrorKind},
    multi::separated_list0,
    sequence::preceded,
    IResult,
};

#[derive(Debug, Default)]
struct GeomArgs {
    x: Option<String>,
    y: Option<String>,
    color: Option<String>,
    names: Option<String>,
    values: Option<String>,
    position: Option<String>,
}

/// Parse `name(key: value, ...)` with the aesthetic keys every geom accepts
fn parse_geom_args<'a>(name: &'static str, input: &'a str) -> IResult<&'a str, GeomArgs> {
    let (input, _) = ws(tag(name))(input)?;
    let (input, _) = ws(char('('))(input)?;

    let (input, args) = separated_list0(
        ws(char(',')),
        alt((
            map(preceded(ws(tag("x:")), ws(identifier)), |v| ("x", v)),
            map(preceded(ws(tag("y:")), ws(identifier)), |v| ("y", v)),
            map(preceded(ws(tag("color:")), ws(identifier)), |v| ("color", v)),
            map(preceded(ws(tag("names:")), ws(identifier)), |v| ("names", v)),
            map(preceded(ws(tag("values:")), ws(identifier)), |v| ("values", v)),
            map(preceded(ws(tag("position:")), ws(string_literal)), |v| ("position", v)),
        )),
    )(input)?;

    let (input, _) = ws(char(')'))(input)?;

    let mut parsed = GeomArgs::default();
    for (key, val) in args {
        match key {
            "x" => parsed.x = Some(val),
            "y" => parsed.y = Some(val),
            "color" => parsed.color = Some(val),
            "names" => parsed.names = Some(val),
            "values" => parsed.values = Some(val),
            "position" => parsed.position = Some(val),
            _ => {}
        }
    }

    Ok((input, parsed))
}

/// A geom was recognised but is missing a required mapping; no other
/// alternative can succeed, so fail hard.
fn required<'a>(input: &'a str, value: Option<String>) -> Result<String, nom::Err<Error<&'a str>>> {
    value.ok_or_else(|| nom::Err::Failure(Error::new(input, ErrorKind::Verify)))
}

fn parse_xy<'a>(name: &'static str, input: &'a str) -> IResult<&'a str, XyGeom> {
    let (rest, args) = parse_geom_args(name, input)?;
    let x = required(input, args.x)?;
    let y = required(input, args.y)?;
    Ok((rest, XyGeom { x, y, color: args.color }))
}

/// Parse a bar geometry
/// Format: bar(x: col, y: col, color: col, position: "group")
pub fn parse_bar(input: &str) -> IResult<&str, Geom> {
    let (rest, args) = parse_geom_args("bar", input)?;
    let x = required(input, args.x)?;
    let y = required(input, args.y)?;

    let position = match args.position.as_deref() {
        None | Some("relative") | Some("stack") => BarPosition::Relative,
        Some("group") | Some("dodge") => BarPosition::Group,
        Some(_) => return Err(nom::Err::Failure(Error::new(input, ErrorKind::Verify))),
    };

    Ok((
        rest,
        Geom::Bar(BarGeom {
            x,
            y,
            color: args.color,
            position,
        }),
    ))
}

/// Parse a pie geometry
/// Format: pie(names: col, values: col, color: col)
pub fn parse_pie(input: &str) -> IResult<&str, Geom> {
    let (rest, args) = parse_geom_args("pie", input)?;
    let names = required(input, args.names)?;
    let values = required(input, args.values)?;
    Ok((
        rest,
        Geom::Pie(PieGeom {
            names,
            values,
            color: args.color,
        }),
    ))
}

/// Format: point(x: col, y: col, color: col); boxplot and violin take the same keys
pub fn parse_point(input: &str) -> IResult<&str, Geom> {
    let (rest, xy) = parse_xy("point", input)?;
    Ok((rest, Geom::Point(xy)))
}

pub fn parse_boxplot(input: &str) -> IResult<&str, Geom> {
    let (rest, xy) = parse_xy("boxplot", input)?;
    Ok((rest, Geom::Boxplot(xy)))
}

pub fn parse_violin(input: &str) -> IResult<&str, Geom> {
    let (rest, xy) = parse_xy("violin", input)?;
    Ok((rest, Geom::Violin(xy)))
}

/// Parse any geometry
pub fn parse_geom(input: &str) -> IResult<&str, Geom> {
    alt((parse_bar, parse_pie, parse_point, parse_boxplot, parse_violin))(input)
}
