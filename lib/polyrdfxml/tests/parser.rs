use oxrdf::vocab::rdf;
use oxrdf::{NamedNodeRef, Subject, Term, Triple};
use polyrdfxml::{RdfXmlParseError, RdfXmlParser, RdfXmlSyntaxErrorKind};

const RDF_NS: &str = r#"xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#""#;

fn parse(file: &str) -> Result<Vec<Triple>, RdfXmlParseError> {
    RdfXmlParser::new().for_slice(file).collect()
}

fn syntax_kind(file: &str) -> RdfXmlSyntaxErrorKind {
    match parse(file).expect_err("the document should be invalid") {
        RdfXmlParseError::Syntax(e) => match e.kind() {
            RdfXmlSyntaxErrorKind::DuplicateRdfId(id) => {
                RdfXmlSyntaxErrorKind::DuplicateRdfId(id.clone())
            }
            RdfXmlSyntaxErrorKind::ForbiddenRdfConstruct(c) => {
                RdfXmlSyntaxErrorKind::ForbiddenRdfConstruct(c.clone())
            }
            RdfXmlSyntaxErrorKind::InvalidParseTypeCombination => {
                RdfXmlSyntaxErrorKind::InvalidParseTypeCombination
            }
            other => RdfXmlSyntaxErrorKind::Msg(other.to_string()),
        },
        RdfXmlParseError::Io(e) => panic!("unexpected I/O error: {e}"),
    }
}

#[test]
fn description_with_nested_property() {
    let triples = parse(&format!(
        r#"<rdf:RDF {RDF_NS} xmlns:ex="http://ex/">
  <rdf:Description rdf:about="http://ex/s">
    <ex:p>
      <rdf:Description rdf:about="http://ex/o">
        <ex:q>v</ex:q>
      </rdf:Description>
    </ex:p>
  </rdf:Description>
</rdf:RDF>"#
    ))
    .unwrap();
    // The nested node element's own triples come out before the enclosing one
    assert_eq!(triples.len(), 2);
    assert_eq!(triples[0].subject.to_string(), "<http://ex/o>");
    assert_eq!(triples[0].object.to_string(), "\"v\"");
    assert_eq!(triples[1].subject.to_string(), "<http://ex/s>");
    assert_eq!(triples[1].object.to_string(), "<http://ex/o>");
}

#[test]
fn rdf_id_reifies_the_asserted_triple() {
    let triples = parse(&format!(
        r#"<rdf:RDF {RDF_NS} xml:base="http://ex/">
  <rdf:Description rdf:about="s">
    <ex:p rdf:ID="r" xmlns:ex="http://ex/">v</ex:p>
  </rdf:Description>
</rdf:RDF>"#
    ))
    .unwrap();
    let statement = NamedNodeRef::new("http://ex/#r").unwrap();
    assert_eq!(triples.len(), 5);
    // The asserted triple first, its four reification triples right after
    assert_eq!(triples[0].subject.to_string(), "<http://ex/s>");
    assert_eq!(triples[0].predicate.as_str(), "http://ex/p");
    assert_eq!(triples[0].object.to_string(), "\"v\"");
    assert_eq!(
        triples[1],
        Triple::new(statement, rdf::TYPE, rdf::STATEMENT)
    );
    assert_eq!(
        triples[2],
        Triple::new(statement, rdf::SUBJECT, NamedNodeRef::new("http://ex/s").unwrap())
    );
    assert_eq!(
        triples[3],
        Triple::new(statement, rdf::PREDICATE, NamedNodeRef::new("http://ex/p").unwrap())
    );
    assert_eq!(triples[4].predicate, rdf::OBJECT);
    assert_eq!(triples[4].object.to_string(), "\"v\"");
}

#[test]
fn duplicate_rdf_id_values_are_rejected() {
    let duplicated = format!(
        r#"<rdf:RDF {RDF_NS} xml:base="http://ex/" xmlns:ex="http://ex/">
  <rdf:Description rdf:about="s">
    <ex:p rdf:ID="r">a</ex:p>
    <ex:q rdf:ID="r">b</ex:q>
  </rdf:Description>
</rdf:RDF>"#
    );
    assert!(matches!(
        syntax_kind(&duplicated),
        RdfXmlSyntaxErrorKind::DuplicateRdfId(id) if id == "http://ex/#r"
    ));
    // Renaming one occurrence restores acceptance
    let fixed = duplicated.replace(r#"rdf:ID="r">b"#, r#"rdf:ID="r2">b"#);
    assert_eq!(parse(&fixed).unwrap().len(), 10);
    // Lenient mode keeps going
    let lenient: Vec<_> = RdfXmlParser::new()
        .lenient()
        .for_slice(&duplicated)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(lenient.len(), 10);
}

#[test]
fn parse_type_collection_builds_a_first_rest_chain() {
    let triples = parse(&format!(
        r#"<rdf:RDF {RDF_NS} xmlns:ex="http://ex/" xml:base="http://ex/">
  <rdf:Description rdf:about="s">
    <ex:p rdf:parseType="Collection">
      <ex:Item rdf:about="a"/>
      <ex:Item rdf:about="b"/>
    </ex:p>
  </rdf:Description>
</rdf:RDF>"#
    ))
    .unwrap();
    // Two type triples for the items, then the five triples of the chain
    assert_eq!(triples.len(), 7);
    assert_eq!(triples[0].object.to_string(), "<http://ex/Item>");
    assert_eq!(triples[1].object.to_string(), "<http://ex/Item>");
    let first = &triples[2];
    assert_eq!(first.predicate, rdf::FIRST);
    assert_eq!(first.object.to_string(), "<http://ex/a>");
    let Subject::BlankNode(n1) = &first.subject else {
        panic!("expected a blank node");
    };
    assert_eq!(triples[3].subject, first.subject);
    assert_eq!(triples[3].predicate, rdf::REST);
    let Term::BlankNode(n2) = &triples[3].object else {
        panic!("expected a blank node");
    };
    assert_ne!(n1, n2);
    assert_eq!(triples[4].subject, Subject::BlankNode(n2.clone()));
    assert_eq!(triples[4].predicate, rdf::FIRST);
    assert_eq!(triples[4].object.to_string(), "<http://ex/b>");
    assert_eq!(triples[5].subject, Subject::BlankNode(n2.clone()));
    assert_eq!(triples[5].object, rdf::NIL.into());
    // The asserted triple closes the sequence, pointing at the head
    assert_eq!(triples[6].subject.to_string(), "<http://ex/s>");
    assert_eq!(Term::from(n1.clone()), triples[6].object);
}

#[test]
fn empty_parse_type_collection_is_nil() {
    let triples = parse(&format!(
        r#"<rdf:RDF {RDF_NS} xmlns:ex="http://ex/">
  <rdf:Description rdf:about="http://ex/s"><ex:p rdf:parseType="Collection"></ex:p></rdf:Description>
</rdf:RDF>"#
    ))
    .unwrap();
    assert_eq!(
        triples,
        [Triple::new(
            NamedNodeRef::new("http://ex/s").unwrap(),
            NamedNodeRef::new("http://ex/p").unwrap(),
            rdf::NIL
        )]
    );
}

#[test]
fn parse_type_resource_opens_an_implicit_node() {
    let triples = parse(&format!(
        r#"<rdf:RDF {RDF_NS} xmlns:ex="http://ex/">
  <rdf:Description rdf:about="http://ex/s">
    <ex:p rdf:parseType="Resource"><ex:q>v</ex:q></ex:p>
  </rdf:Description>
</rdf:RDF>"#
    ))
    .unwrap();
    assert_eq!(triples.len(), 2);
    let Term::BlankNode(node) = &triples[0].object else {
        panic!("expected a blank node");
    };
    assert_eq!(triples[1].subject, Subject::BlankNode(node.clone()));
    assert_eq!(triples[1].object.to_string(), "\"v\"");
}

#[test]
fn li_elements_are_numbered_per_container() {
    let triples = parse(&format!(
        r#"<rdf:RDF {RDF_NS}>
  <rdf:Seq rdf:about="http://ex/seq1"><rdf:li>a</rdf:li><rdf:li>b</rdf:li></rdf:Seq>
  <rdf:Seq rdf:about="http://ex/seq2"><rdf:li>c</rdf:li></rdf:Seq>
</rdf:RDF>"#
    ))
    .unwrap();
    let predicates: Vec<_> = triples
        .iter()
        .filter(|t| t.predicate != rdf::TYPE)
        .map(|t| t.predicate.as_str().to_owned())
        .collect();
    assert_eq!(
        predicates,
        [
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#_1",
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#_2",
            "http://www.w3.org/1999/02/22-rdf-syntax-ns#_1",
        ]
    );
}

#[test]
fn xml_literals_are_canonicalized() {
    let a = parse(&format!(
        r#"<rdf:RDF {RDF_NS} xmlns:ex="http://ex/">
  <rdf:Description rdf:about="http://ex/s"><ex:p rdf:parseType="Literal"><ex:b z="1" a="2">t</ex:b></ex:p></rdf:Description>
</rdf:RDF>"#
    ))
    .unwrap();
    let b = parse(&format!(
        r#"<rdf:RDF {RDF_NS} xmlns:ex="http://ex/">
  <rdf:Description rdf:about="http://ex/s"><ex:p rdf:parseType="Literal"><ex:b a="2" z="1">t</ex:b></ex:p></rdf:Description>
</rdf:RDF>"#
    ))
    .unwrap();
    // Attribute order in the source does not leak into the literal
    assert_eq!(a, b);
    let Term::Literal(literal) = &a[0].object else {
        panic!("expected a literal");
    };
    assert_eq!(literal.datatype(), rdf::XML_LITERAL);
    // The outer namespace declarations are pushed onto the literal root
    assert_eq!(
        literal.value(),
        "<ex:b xmlns:ex=\"http://ex/\" xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\" a=\"2\" z=\"1\">t</ex:b>"
    );
}

#[test]
fn parse_type_literal_rejects_contradicting_attributes() {
    assert!(matches!(
        syntax_kind(&format!(
            r#"<rdf:RDF {RDF_NS} xmlns:ex="http://ex/">
  <rdf:Description rdf:about="http://ex/s"><ex:p rdf:parseType="Literal" rdf:resource="http://ex/o"/></rdf:Description>
</rdf:RDF>"#
        )),
        RdfXmlSyntaxErrorKind::InvalidParseTypeCombination
    ));
}

#[test]
fn reserved_names_are_forbidden() {
    // rdf:aboutEach as an attribute
    assert!(matches!(
        syntax_kind(&format!(
            r#"<rdf:RDF {RDF_NS} xmlns:ex="http://ex/">
  <rdf:Description rdf:aboutEach="http://ex/s"><ex:p>v</ex:p></rdf:Description>
</rdf:RDF>"#
        )),
        RdfXmlSyntaxErrorKind::ForbiddenRdfConstruct(_)
    ));
    // rdf:bagID as an attribute
    assert!(matches!(
        syntax_kind(&format!(
            r#"<rdf:RDF {RDF_NS} xmlns:ex="http://ex/">
  <rdf:Description rdf:bagID="b"><ex:p>v</ex:p></rdf:Description>
</rdf:RDF>"#
        )),
        RdfXmlSyntaxErrorKind::ForbiddenRdfConstruct(_)
    ));
    // rdf:li as an attribute
    assert!(matches!(
        syntax_kind(&format!(
            r#"<rdf:RDF {RDF_NS}>
  <rdf:Description rdf:li="x"/>
</rdf:RDF>"#
        )),
        RdfXmlSyntaxErrorKind::ForbiddenRdfConstruct(_)
    ));
    // rdf:Description as a property element
    assert!(matches!(
        syntax_kind(&format!(
            r#"<rdf:RDF {RDF_NS}>
  <rdf:Description rdf:about="http://ex/s"><rdf:Description>v</rdf:Description></rdf:Description>
</rdf:RDF>"#
        )),
        RdfXmlSyntaxErrorKind::ForbiddenRdfConstruct(_)
    ));
    // rdf:ID as a node element
    assert!(matches!(
        syntax_kind(&format!(
            r#"<rdf:RDF {RDF_NS}><rdf:ID/></rdf:RDF>"#
        )),
        RdfXmlSyntaxErrorKind::ForbiddenRdfConstruct(_)
    ));
}

#[test]
fn conflicting_subject_attributes_are_rejected() {
    assert!(parse(&format!(
        r#"<rdf:RDF {RDF_NS} xml:base="http://ex/">
  <rdf:Description rdf:ID="i" rdf:nodeID="n"/>
</rdf:RDF>"#
    ))
    .is_err());
    assert!(parse(&format!(
        r#"<rdf:RDF {RDF_NS} xml:base="http://ex/">
  <rdf:Description rdf:about="http://ex/s" rdf:nodeID="n"/>
</rdf:RDF>"#
    ))
    .is_err());
}

#[test]
fn node_ids_are_scoped_to_the_document() {
    let triples = parse(&format!(
        r#"<rdf:RDF {RDF_NS} xmlns:ex="http://ex/">
  <rdf:Description rdf:nodeID="x"><ex:p rdf:nodeID="y"/></rdf:Description>
  <rdf:Description rdf:nodeID="x"><ex:q>v</ex:q></rdf:Description>
</rdf:RDF>"#
    ))
    .unwrap();
    assert_eq!(triples.len(), 2);
    // The two nodeID="x" elements name the same blank node
    assert_eq!(triples[0].subject, triples[1].subject);
    let Subject::BlankNode(x) = &triples[0].subject else {
        panic!("expected a blank node");
    };
    // The written label is renamed to an internal identifier
    assert_ne!(x.as_str(), "x");
    assert_ne!(Term::from(x.clone()), triples[0].object);
}

#[test]
fn typed_nodes_and_property_attributes() {
    let triples = parse(&format!(
        r#"<rdf:RDF {RDF_NS} xmlns:schema="http://schema.org/">
  <schema:Person rdf:about="http://example.com/bar" schema:name="Bar" xml:lang="en"/>
</rdf:RDF>"#
    ))
    .unwrap();
    assert_eq!(triples.len(), 2);
    let Term::Literal(name) = &triples[0].object else {
        panic!("expected a literal");
    };
    assert_eq!(name.value(), "Bar");
    assert_eq!(name.language(), Some("en"));
    assert_eq!(
        triples[1],
        Triple::new(
            NamedNodeRef::new("http://example.com/bar").unwrap(),
            rdf::TYPE,
            NamedNodeRef::new("http://schema.org/Person").unwrap()
        )
    );
}

#[test]
fn xml_lang_is_inherited_and_can_be_reset() {
    let triples = parse(&format!(
        r#"<rdf:RDF {RDF_NS} xmlns:ex="http://ex/" xml:lang="fr">
  <rdf:Description rdf:about="http://ex/s">
    <ex:p>bonjour</ex:p>
    <ex:p xml:lang="en-US">hi</ex:p>
    <ex:p xml:lang="">plain</ex:p>
  </rdf:Description>
</rdf:RDF>"#
    ))
    .unwrap();
    let languages: Vec<_> = triples
        .iter()
        .map(|t| {
            let Term::Literal(l) = &t.object else {
                panic!("expected a literal");
            };
            l.language().map(ToOwned::to_owned)
        })
        .collect();
    assert_eq!(
        languages,
        [Some("fr".to_owned()), Some("en-us".to_owned()), None]
    );
}

#[test]
fn empty_property_elements_are_empty_literals() {
    let triples = parse(&format!(
        r#"<rdf:RDF {RDF_NS} xmlns:ex="http://ex/">
  <rdf:Description rdf:about="http://ex/s"><ex:p/></rdf:Description>
</rdf:RDF>"#
    ))
    .unwrap();
    assert_eq!(triples[0].object.to_string(), "\"\"");
}

#[test]
fn datatype_attributes_type_the_literal() {
    let triples = parse(&format!(
        r#"<rdf:RDF {RDF_NS} xmlns:ex="http://ex/">
  <rdf:Description rdf:about="http://ex/s"><ex:p rdf:datatype="http://www.w3.org/2001/XMLSchema#integer">4</ex:p></rdf:Description>
</rdf:RDF>"#
    ))
    .unwrap();
    let Term::Literal(literal) = &triples[0].object else {
        panic!("expected a literal");
    };
    assert_eq!(literal.value(), "4");
    assert_eq!(
        literal.datatype().as_str(),
        "http://www.w3.org/2001/XMLSchema#integer"
    );
}

#[test]
fn custom_entities_are_resolved() {
    let triples = parse(&format!(
        r#"<?xml version="1.0"?>
<!DOCTYPE rdf:RDF [<!ENTITY ex "http://example.com/">]>
<rdf:RDF {RDF_NS} xmlns:s="http://schema.org/">
  <rdf:Description rdf:about="&ex;thing" s:name="Thing"/>
</rdf:RDF>"#
    ))
    .unwrap();
    assert_eq!(triples[0].subject.to_string(), "<http://example.com/thing>");
}

#[test]
fn a_single_node_element_may_be_the_root() {
    let triples = parse(
        r#"<rdf:Description xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:ex="http://ex/" rdf:about="http://ex/s"><ex:p>v</ex:p></rdf:Description>"#,
    )
    .unwrap();
    assert_eq!(triples.len(), 1);
}

#[test]
fn relative_iris_need_a_base() {
    assert!(parse(&format!(
        r#"<rdf:RDF {RDF_NS}><rdf:Description rdf:about="s"/></rdf:RDF>"#
    ))
    .is_err());
    let triples = RdfXmlParser::new()
        .with_base_iri("http://ex/")
        .unwrap()
        .for_slice(&format!(
            r#"<rdf:RDF {RDF_NS} xmlns:ex="http://ex/"><rdf:Description rdf:about="s"><ex:p>v</ex:p></rdf:Description></rdf:RDF>"#
        ))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(triples[0].subject.to_string(), "<http://ex/s>");
}

#[test]
fn unclosed_documents_are_rejected() {
    assert!(parse(&format!(
        r#"<rdf:RDF {RDF_NS}><rdf:Description rdf:about="http://ex/s">"#
    ))
    .is_err());
}

#[test]
fn a_failure_ends_the_stream() {
    let input = format!(
        r#"<rdf:RDF {RDF_NS} xml:base="http://ex/" xmlns:ex="http://ex/">
  <rdf:Description rdf:about="s"><ex:p rdf:ID="r">a</ex:p><ex:q rdf:ID="r">b</ex:q></rdf:Description>
</rdf:RDF>"#
    );
    let mut parser = RdfXmlParser::new().for_slice(&input);
    let mut seen_error = false;
    for result in &mut parser {
        if result.is_err() {
            seen_error = true;
            break;
        }
    }
    assert!(seen_error);
    assert!(parser.next().is_none());
}
