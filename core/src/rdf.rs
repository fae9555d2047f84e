// weaver/src/rdf.rs

//! Small helpers around `oxrdf`/`oxttl`: parsing text into graphs, merging
//! upstream graphs, and writing N-Triples.

use crate::error::{EngineError, EngineResult};
use once_cell::sync::Lazy;
use oxrdf::{Graph, Term, TermRef};
use oxttl::{NTriplesParser, TurtleParser};
use regex::Regex;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;

static ABSOLUTE_URI: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^(?:[A-Za-z][A-Za-z0-9+.\-]*://|urn:)[^\s<>]+$").expect("valid regex"));

pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RdfFormat {
  #[default]
  Turtle,
  NTriples,
}

impl FromStr for RdfFormat {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "turtle" | "ttl" => Ok(RdfFormat::Turtle),
      "ntriples" | "n-triples" | "nt" => Ok(RdfFormat::NTriples),
      other => Err(format!("unsupported RDF format '{}'", other)),
    }
  }
}

/// Parses Turtle or N-Triples text into a graph.
pub fn parse_graph(text: &str, format: RdfFormat) -> EngineResult<Graph> {
  let mut graph = Graph::new();
  match format {
    RdfFormat::Turtle => {
      for triple in TurtleParser::new().for_slice(text.as_bytes()) {
        let triple = triple.map_err(|e| EngineError::RdfParse { message: e.to_string() })?;
        graph.insert(&triple);
      }
    }
    RdfFormat::NTriples => {
      for triple in NTriplesParser::new().for_slice(text.as_bytes()) {
        let triple = triple.map_err(|e| EngineError::RdfParse { message: e.to_string() })?;
        graph.insert(&triple);
      }
    }
  }
  Ok(graph)
}

/// Union of several graphs. A single input is passed through without copying.
pub fn merge_graphs(graphs: Vec<Arc<Graph>>) -> Option<Arc<Graph>> {
  match graphs.len() {
    0 => None,
    1 => graphs.into_iter().next(),
    _ => {
      let mut merged = Graph::new();
      for graph in &graphs {
        merged.extend(graph.iter());
      }
      Some(Arc::new(merged))
    }
  }
}

/// Writes every triple of `graph` as one N-Triples line. Returns the count.
pub fn write_ntriples<W: Write>(graph: &Graph, mut writer: W) -> EngineResult<usize> {
  let mut count = 0;
  for triple in graph.iter() {
    writeln!(writer, "{} .", triple)?;
    count += 1;
  }
  writer.flush()?;
  Ok(count)
}

/// True for strings shaped like an absolute URI: `scheme://…` or `urn:…`
/// with no whitespace. Plain `word:word` values stay literals.
pub fn looks_like_absolute_uri(value: &str) -> bool {
  ABSOLUTE_URI.is_match(value)
}

/// The part after the last `#`, `/` or `:`.
pub fn local_name(iri: &str) -> &str {
  iri
    .rfind(['#', '/', ':'])
    .map(|idx| &iri[idx + 1..])
    .unwrap_or(iri)
}

/// Human-oriented rendering: IRIs bare, literals by lexical form, blank nodes as `_:id`.
pub fn term_label(term: TermRef<'_>) -> String {
  match term {
    TermRef::NamedNode(node) => node.as_str().to_string(),
    TermRef::BlankNode(node) => format!("_:{}", node.as_str()),
    TermRef::Literal(literal) => literal.value().to_string(),
    #[allow(unreachable_patterns)]
    other => other.to_string(),
  }
}

pub fn owned_label(term: &Term) -> String {
  term_label(term.as_ref())
}
