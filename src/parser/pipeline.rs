// Pipeline parser for chart recipes

use super::ast::{ChartSpec, FacetGrid, Geom, Labels, Source};
use super::facet::parse_facet_grid;
use super::geom::parse_geom;
use super::labels::parse_labs;
use super::lexer::{identifier, ws};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{eof, map, value},
    error::{Error, ErrorKind},
    multi::{many0, separated_list1},
    sequence::{delimited, preceded},
    IResult,
};

#[derive(Debug)]
enum PipelineComponent {
    Geom(Geom),
    Facet(FacetGrid),
    Labels(Labels),
}

fn parse_pipeline_component(input: &str) -> IResult<&str, PipelineComponent> {
    alt((
        map(parse_geom, PipelineComponent::Geom),
        map(parse_facet_grid, PipelineComponent::Facet),
        map(parse_labs, PipelineComponent::Labels),
    ))(input)
}

/// Parse the leading source: `data` or `count(col, ...)`
pub fn parse_source(input: &str) -> IResult<&str, Source> {
    alt((
        map(
            preceded(
                ws(tag("count")),
                delimited(
                    ws(char('(')),
                    separated_list1(ws(char(',')), ws(identifier)),
                    ws(char(')')),
                ),
            ),
            Source::Count,
        ),
        value(Source::Data, ws(tag("data"))),
    ))(input)
}

/// Parse a complete chart recipe
/// Format: source | geom | [facet_grid(...)] | [labs(...)]
pub fn parse_chart_spec(input: &str) -> IResult<&str, ChartSpec> {
    let (input, source) = parse_source(input)?;

    let (input, components) = many0(preceded(ws(tag("|")), parse_pipeline_component))(input)?;

    let (input, _) = ws(eof)(input)?;

    let mut geoms = Vec::new();
    let mut facet = None;
    let mut labels = Labels::default();

    for comp in components {
        match comp {
            PipelineComponent::Geom(g) => geoms.push(g),
            PipelineComponent::Facet(f) => facet = Some(f),
            PipelineComponent::Labels(l) => {
                if l.title.is_some() {
                    labels.title = l.title;
                }
                labels.columns.extend(l.columns);
            }
        }
    }

    // Exactly one geometry per chart
    if geoms.len() != 1 {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Verify)));
    }
    let geom = geoms.remove(0);

    Ok((
        input,
        ChartSpec {
            source,
            geom,
            facet,
            labels,
        },
    ))
}
