use oxrdf::{Subject, Term, Triple};
use polyttl::{NTriplesParser, TurtleParser};
use std::collections::HashMap;
use std::fmt::Write;

/// Rewrites blank node identifiers by order of first occurrence, so that two
/// statement lists can be compared up to blank node renaming.
fn first_occurrence_form(triples: &[Triple]) -> Vec<String> {
    let mut ids = HashMap::new();
    triples
        .iter()
        .map(|t| {
            let subject = match &t.subject {
                Subject::BlankNode(b) => canonical_id(&mut ids, b.as_str()),
                s => s.to_string(),
            };
            let object = match &t.object {
                Term::BlankNode(b) => canonical_id(&mut ids, b.as_str()),
                o => o.to_string(),
            };
            format!("{subject} {} {object}", t.predicate)
        })
        .collect()
}

fn canonical_id(ids: &mut HashMap<String, usize>, id: &str) -> String {
    let next = ids.len();
    let n = *ids.entry(id.to_owned()).or_insert(next);
    format!("_:c{n}")
}

#[test]
fn turtle_round_trips_through_ntriples() {
    let file = r#"@prefix ex: <http://ex/> .
@base <http://example.com/> .
<s> a ex:Thing ;
    ex:p ( 1 2.5 "x"@en ) ;
    ex:q [ ex:r "y"^^ex:t ] , true .
_:node ex:p <s> .
"#;
    let triples = TurtleParser::new()
        .for_slice(file)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let mut serialized = String::new();
    for t in &triples {
        writeln!(serialized, "{t} .").unwrap();
    }
    let reparsed = NTriplesParser::new()
        .for_slice(&serialized)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(triples.len(), reparsed.len());
    assert_eq!(
        first_occurrence_form(&triples),
        first_occurrence_form(&reparsed)
    );
}

#[test]
fn parsing_is_deterministic_across_runs() {
    let file = r#"@prefix ex: <http://ex/> .
ex:s ex:p [ ex:q ( ex:a [ ex:r "v" ] ) ] .
"#;
    let first = TurtleParser::new()
        .for_slice(file)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let second = TurtleParser::new()
        .for_slice(file)
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(first, second);
}
