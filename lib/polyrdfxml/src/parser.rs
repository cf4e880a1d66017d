use crate::error::{RdfXmlParseError, RdfXmlSyntaxError, RdfXmlSyntaxErrorKind};
use crate::utils::{is_nc_name, is_utf8, is_whitespace};
use oxilangtag::LanguageTag;
use oxiri::{Iri, IriParseError};
use oxrdf::vocab::rdf;
use oxrdf::{BlankNode, Literal, NamedNode, Subject, Term, Triple};
use quick_xml::escape::unescape_with;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::{LocalName, QName, ResolveResult};
use quick_xml::{Error, NsReader, Writer};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::io::{BufReader, Read};
use std::str;

/// A [RDF/XML](https://www.w3.org/TR/rdf-syntax-grammar/) streaming parser.
///
/// It reads the file in streaming. It does not keep data in memory except a
/// stack for handling nested XML tags and a set of all seen `rdf:ID`s to
/// detect duplicates.
///
/// Count the number of people:
/// ```
/// use oxrdf::vocab::rdf;
/// use oxrdf::NamedNodeRef;
/// use polyrdfxml::RdfXmlParser;
///
/// let file = br#"<?xml version="1.0"?>
/// <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:schema="http://schema.org/">
///  <rdf:Description rdf:about="http://example.com/foo">
///    <rdf:type rdf:resource="http://schema.org/Person" />
///    <schema:name>Foo</schema:name>
///  </rdf:Description>
///  <schema:Person rdf:about="http://example.com/bar" schema:name="Bar" />
/// </rdf:RDF>"#;
///
/// let schema_person = NamedNodeRef::new("http://schema.org/Person")?;
/// let mut count = 0;
/// for triple in RdfXmlParser::new().for_reader(file.as_ref()) {
///     let triple = triple?;
///     if triple.predicate == rdf::TYPE && triple.object == schema_person.into() {
///         count += 1;
///     }
/// }
/// assert_eq!(2, count);
/// # Result::<_,Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Default, Clone)]
#[must_use]
pub struct RdfXmlParser {
    lenient: bool,
    base: Option<Iri<String>>,
}

impl RdfXmlParser {
    /// Builds a new [`RdfXmlParser`].
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assumes the file is valid to make parsing faster.
    ///
    /// It will skip some validations (IRI and language tag well-formedness,
    /// duplicate `rdf:ID` detection).
    ///
    /// Note that if the file is actually not valid, the parser might emit broken RDF.
    #[inline]
    pub fn lenient(mut self) -> Self {
        self.lenient = true;
        self
    }

    /// The IRI to resolve the relative IRIs of the document against.
    #[inline]
    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Result<Self, IriParseError> {
        self.base = Some(Iri::parse(base_iri.into())?);
        Ok(self)
    }

    /// Parses a RDF/XML file from a [`Read`] implementation.
    pub fn for_reader<R: Read>(self, reader: R) -> ReaderRdfXmlParser<R> {
        let mut xml_reader = NsReader::from_reader(BufReader::new(reader));
        xml_reader.expand_empty_elements(true);
        ReaderRdfXmlParser {
            results: VecDeque::new(),
            parser: RdfXmlReader {
                reader: xml_reader,
                state: vec![RdfXmlState::Doc {
                    base_iri: self.base.clone(),
                }],
                custom_entities: HashMap::new(),
                namespaces: Vec::new(),
                depth: 0,
                in_literal_depth: 0,
                known_rdf_id: HashSet::new(),
                blank_nodes: BlankNodeScope::default(),
                is_end: false,
                lenient: self.lenient,
            },
            reader_buffer: Vec::new(),
            failed: false,
        }
    }

    /// Parses a RDF/XML file from a byte slice.
    ///
    /// ```
    /// use polyrdfxml::RdfXmlParser;
    ///
    /// let file = br#"<?xml version="1.0"?>
    /// <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
    ///  <rdf:Description rdf:about="http://example.com/foo" />
    /// </rdf:RDF>"#;
    /// assert!(RdfXmlParser::new().for_slice(file).all(|t| t.is_ok()));
    /// ```
    pub fn for_slice<'a>(self, slice: &'a (impl AsRef<[u8]> + ?Sized)) -> ReaderRdfXmlParser<&'a [u8]> {
        self.for_reader(slice.as_ref())
    }
}

/// Parses a RDF/XML file from a [`Read`] implementation.
///
/// Can be built using [`RdfXmlParser::for_reader`].
#[must_use]
pub struct ReaderRdfXmlParser<R: Read> {
    results: VecDeque<Triple>,
    parser: RdfXmlReader<BufReader<R>>,
    reader_buffer: Vec<u8>,
    failed: bool,
}

impl<R: Read> Iterator for ReaderRdfXmlParser<R> {
    type Item = Result<Triple, RdfXmlParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(triple) = self.results.pop_front() {
                return Some(Ok(triple));
            }
            if self.failed || self.parser.is_end {
                return None;
            }
            if let Err(e) = self.parse_step() {
                // A failure is terminal, following pulls see the end
                self.failed = true;
                return Some(Err(match e {
                    RdfXmlParseError::Syntax(e) => {
                        RdfXmlParseError::Syntax(e.with_position(self.buffer_position()))
                    }
                    e => e,
                }));
            }
        }
    }
}

impl<R: Read> ReaderRdfXmlParser<R> {
    /// The current byte position in the input data.
    pub fn buffer_position(&self) -> u64 {
        u64::try_from(self.parser.reader.buffer_position()).unwrap_or(u64::MAX)
    }

    fn parse_step(&mut self) -> Result<(), RdfXmlParseError> {
        self.reader_buffer.clear();
        let event = self
            .parser
            .reader
            .read_event_into(&mut self.reader_buffer)?;
        self.parser.parse_event(event, &mut self.results)
    }
}

const RDF_ABOUT: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#about";
const RDF_ABOUT_EACH: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#aboutEach";
const RDF_ABOUT_EACH_PREFIX: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#aboutEachPrefix";
const RDF_BAG_ID: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#bagID";
const RDF_DATATYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#datatype";
const RDF_DESCRIPTION: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#Description";
const RDF_ID: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#ID";
const RDF_LI: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#li";
const RDF_NODE_ID: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nodeID";
const RDF_PARSE_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#parseType";
const RDF_RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#RDF";
const RDF_RESOURCE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#resource";

const RESERVED_RDF_ELEMENTS: [&str; 11] = [
    RDF_ABOUT,
    RDF_ABOUT_EACH,
    RDF_ABOUT_EACH_PREFIX,
    RDF_BAG_ID,
    RDF_DATATYPE,
    RDF_ID,
    RDF_LI,
    RDF_NODE_ID,
    RDF_PARSE_TYPE,
    RDF_RDF,
    RDF_RESOURCE,
];
const RESERVED_RDF_ATTRIBUTES: [&str; 5] = [
    RDF_ABOUT_EACH,
    RDF_ABOUT_EACH_PREFIX,
    RDF_BAG_ID,
    RDF_LI,
    RDF_RDF,
];

/// Document-scoped blank node identifiers, shared by `rdf:nodeID` labels and
/// the anonymous nodes the grammar materializes.
#[derive(Default)]
struct BlankNodeScope {
    labels: HashMap<String, BlankNode>,
    counter: u64,
}

impl BlankNodeScope {
    fn labeled(&mut self, label: &str) -> BlankNode {
        if let Some(node) = self.labels.get(label) {
            return node.clone();
        }
        let node = self.fresh();
        self.labels.insert(label.to_owned(), node.clone());
        node
    }

    fn fresh(&mut self) -> BlankNode {
        let node = BlankNode::new_unchecked(format!("b{}", self.counter));
        self.counter += 1;
        node
    }
}

#[derive(Clone, Debug)]
enum NodeOrText {
    Node(Subject),
    Text(String),
}

enum RdfXmlState {
    Doc {
        base_iri: Option<Iri<String>>,
    },
    Rdf {
        base_iri: Option<Iri<String>>,
        language: Option<String>,
    },
    NodeElt {
        base_iri: Option<Iri<String>>,
        language: Option<String>,
        subject: Subject,
        li_counter: u64,
    },
    PropertyElt {
        // Resource, literal or empty property element
        iri: NamedNode,
        base_iri: Option<Iri<String>>,
        language: Option<String>,
        subject: Subject,
        object: Option<NodeOrText>,
        id_attr: Option<NamedNode>,
        datatype_attr: Option<NamedNode>,
    },
    ParseTypeCollectionPropertyElt {
        iri: NamedNode,
        base_iri: Option<Iri<String>>,
        language: Option<String>,
        subject: Subject,
        objects: Vec<Subject>,
        id_attr: Option<NamedNode>,
    },
    ParseTypeLiteralPropertyElt {
        iri: NamedNode,
        base_iri: Option<Iri<String>>,
        language: Option<String>,
        subject: Subject,
        writer: Writer<Vec<u8>>,
        id_attr: Option<NamedNode>,
    },
}

impl RdfXmlState {
    fn base_iri(&self) -> Option<&Iri<String>> {
        match self {
            Self::Doc { base_iri, .. }
            | Self::Rdf { base_iri, .. }
            | Self::NodeElt { base_iri, .. }
            | Self::PropertyElt { base_iri, .. }
            | Self::ParseTypeCollectionPropertyElt { base_iri, .. }
            | Self::ParseTypeLiteralPropertyElt { base_iri, .. } => base_iri.as_ref(),
        }
    }

    fn language(&self) -> Option<&String> {
        match self {
            Self::Doc { .. } => None,
            Self::Rdf { language, .. }
            | Self::NodeElt { language, .. }
            | Self::PropertyElt { language, .. }
            | Self::ParseTypeCollectionPropertyElt { language, .. }
            | Self::ParseTypeLiteralPropertyElt { language, .. } => language.as_ref(),
        }
    }
}

struct RdfXmlReader<R> {
    reader: NsReader<R>,
    state: Vec<RdfXmlState>,
    custom_entities: HashMap<String, String>,
    /// Namespace declarations in scope, with the element depth they live at
    namespaces: Vec<(usize, String, String)>,
    depth: usize,
    in_literal_depth: usize,
    known_rdf_id: HashSet<String>,
    blank_nodes: BlankNodeScope,
    is_end: bool,
    lenient: bool,
}

impl<R> RdfXmlReader<R> {
    fn parse_event(
        &mut self,
        event: Event<'_>,
        results: &mut VecDeque<Triple>,
    ) -> Result<(), RdfXmlParseError> {
        match event {
            Event::Start(event) => {
                self.depth += 1;
                self.register_namespaces(&event)?;
                self.parse_start_event(&event, results)
            }
            Event::End(event) => {
                let result = self.parse_end_event(&event, results);
                let depth = self.depth;
                self.namespaces.retain(|(d, ..)| *d != depth);
                self.depth = self.depth.saturating_sub(1);
                result
            }
            Event::Empty(_) => Err(RdfXmlSyntaxError::msg(
                "The expand_empty_elements option must be enabled",
            )
            .into()),
            Event::Text(event) => self.parse_text_event(&event),
            Event::CData(event) => self.parse_text_event(&event.escape()?),
            Event::Comment(_) | Event::PI(_) => Ok(()),
            Event::Decl(decl) => {
                if let Some(encoding) = decl.encoding() {
                    let encoding = encoding?;
                    if !is_utf8(&encoding) {
                        return Err(RdfXmlSyntaxError::new(
                            RdfXmlSyntaxErrorKind::InvalidEncoding(
                                String::from_utf8_lossy(&encoding).into_owned(),
                            ),
                        )
                        .into());
                    }
                }
                Ok(())
            }
            Event::DocType(dt) => self.parse_doctype(&dt),
            Event::Eof => {
                if self.state.len() > 1 {
                    return Err(RdfXmlSyntaxError::msg(
                        "unexpected end of file: all XML elements are not closed",
                    )
                    .into());
                }
                self.is_end = true;
                Ok(())
            }
        }
    }

    fn parse_doctype(&mut self, dt: &BytesText<'_>) -> Result<(), RdfXmlParseError> {
        // We extract the entities
        for input in self
            .reader
            .decoder()
            .decode(dt.as_ref())?
            .split('<')
            .skip(1)
        {
            if let Some(input) = input.strip_prefix("!ENTITY") {
                let input = input.trim_start().strip_prefix('%').unwrap_or(input);
                let (entity_name, input) = input
                    .trim_start()
                    .split_once(|c: char| c.is_ascii_whitespace())
                    .ok_or_else(|| {
                        RdfXmlSyntaxError::msg(
                        "<!ENTITY declarations should contain both an entity name and an entity value",
                    )
                    })?;
                let input = input.trim_start().strip_prefix('\"').ok_or_else(|| {
                    RdfXmlSyntaxError::msg("<!ENTITY values should be enclosed in double quotes")
                })?;
                let (entity_value, input) = input.split_once('"').ok_or_else(|| {
                    RdfXmlSyntaxError::msg(
                        "<!ENTITY declarations values should be enclosed in double quotes",
                    )
                })?;
                input.trim_start().strip_prefix('>').ok_or_else(|| {
                    RdfXmlSyntaxError::msg("<!ENTITY declarations values should end with >")
                })?;

                // Resolves custom entities within the current entity definition
                let entity_value = unescape_with(entity_value, |e| self.resolve_entity(e))
                    .map_err(Error::from)?;
                self.custom_entities
                    .insert(entity_name.to_owned(), entity_value.to_string());
            }
        }
        Ok(())
    }

    fn register_namespaces(&mut self, event: &BytesStart<'_>) -> Result<(), RdfXmlParseError> {
        for attribute in event.attributes() {
            let attribute = attribute.map_err(Error::InvalidAttr)?;
            let key = attribute.key.as_ref();
            if key == b"xmlns" {
                let value = self.convert_attribute(&attribute)?;
                self.namespaces.push((self.depth, String::new(), value));
            } else if let Some(prefix) = key.strip_prefix(b"xmlns:") {
                let prefix = self.reader.decoder().decode(prefix)?.to_string();
                let value = self.convert_attribute(&attribute)?;
                self.namespaces.push((self.depth, prefix, value));
            }
        }
        Ok(())
    }

    fn parse_start_event(
        &mut self,
        event: &BytesStart<'_>,
        results: &mut VecDeque<Triple>,
    ) -> Result<(), RdfXmlParseError> {
        #[derive(PartialEq, Eq)]
        enum RdfXmlParseType {
            Default,
            Collection,
            Literal,
            Resource,
            Other,
        }

        #[derive(PartialEq, Eq)]
        enum RdfXmlNextProduction {
            Rdf,
            NodeElt,
            PropertyElt { subject: Subject },
        }

        // Literal case: the element belongs to the XML literal being collected
        if matches!(
            self.state.last(),
            Some(RdfXmlState::ParseTypeLiteralPropertyElt { .. })
        ) {
            let clean_event = self.canonical_literal_start(event)?;
            if let Some(RdfXmlState::ParseTypeLiteralPropertyElt { writer, .. }) =
                self.state.last_mut()
            {
                writer.write_event(Event::Start(clean_event))?;
            }
            self.in_literal_depth += 1;
            return Ok(());
        }

        let tag_name = self.resolve_tag_name(event.name())?;

        // We read the attributes
        let (mut language, mut base_iri) = if let Some(current_state) = self.state.last() {
            (
                current_state.language().cloned(),
                current_state.base_iri().cloned(),
            )
        } else {
            (None, None)
        };

        let mut id_attr = None;
        let mut node_id_attr = None;
        let mut about_attr = None;
        let mut property_attrs = Vec::new();
        let mut resource_attr = None;
        let mut datatype_attr = None;
        let mut parse_type = RdfXmlParseType::Default;
        let mut type_attr = None;

        for attribute in event.attributes() {
            let attribute = attribute.map_err(Error::InvalidAttr)?;
            if attribute.key.as_ref().starts_with(b"xml") {
                if attribute.key.as_ref() == b"xml:lang" {
                    let tag = self.convert_attribute(&attribute)?;
                    language = if tag.is_empty() {
                        // xml:lang="" removes the in-scope language
                        None
                    } else if self.lenient {
                        Some(tag.to_ascii_lowercase())
                    } else {
                        Some(
                            LanguageTag::parse(tag.to_ascii_lowercase())
                                .map_err(|error| {
                                    RdfXmlSyntaxError::new(
                                        RdfXmlSyntaxErrorKind::InvalidLanguageTag { tag, error },
                                    )
                                })?
                                .into_inner(),
                        )
                    };
                } else if attribute.key.as_ref() == b"xml:base" {
                    let iri = self.convert_attribute(&attribute)?;
                    base_iri = Some(
                        if self.lenient {
                            Ok(Iri::parse_unchecked(iri.clone()))
                        } else {
                            Iri::parse(iri.clone())
                        }
                        .map_err(|error| {
                            RdfXmlSyntaxError::new(RdfXmlSyntaxErrorKind::InvalidIri {
                                iri,
                                error,
                            })
                        })?,
                    )
                } else {
                    // We ignore the other xml attributes, xmlns declarations included
                }
            } else {
                let attribute_url = self.resolve_attribute_name(attribute.key)?;
                if *attribute_url == *RDF_ID {
                    let mut id = self.convert_attribute(&attribute)?;
                    if !is_nc_name(&id) {
                        return Err(RdfXmlSyntaxError::msg(format!(
                            "{id} is not a valid rdf:ID value"
                        ))
                        .into());
                    }
                    id.insert(0, '#');
                    id_attr = Some(id);
                } else if *attribute_url == *RDF_NODE_ID {
                    let id = self.convert_attribute(&attribute)?;
                    if !is_nc_name(&id) {
                        return Err(RdfXmlSyntaxError::msg(format!(
                            "{id} is not a valid rdf:nodeID value"
                        ))
                        .into());
                    }
                    node_id_attr = Some(self.blank_nodes.labeled(&id));
                } else if *attribute_url == *RDF_ABOUT {
                    about_attr = Some(attribute);
                } else if *attribute_url == *RDF_RESOURCE {
                    resource_attr = Some(attribute);
                } else if *attribute_url == *RDF_DATATYPE {
                    datatype_attr = Some(attribute);
                } else if *attribute_url == *RDF_PARSE_TYPE {
                    parse_type = match attribute.value.as_ref() {
                        b"Collection" => RdfXmlParseType::Collection,
                        b"Literal" => RdfXmlParseType::Literal,
                        b"Resource" => RdfXmlParseType::Resource,
                        _ => RdfXmlParseType::Other,
                    };
                } else if attribute_url == rdf::TYPE.as_str() {
                    type_attr = Some(attribute);
                } else if RESERVED_RDF_ATTRIBUTES.contains(&&*attribute_url) {
                    return Err(RdfXmlSyntaxError::new(
                        RdfXmlSyntaxErrorKind::ForbiddenRdfConstruct(format!(
                            "the attribute {attribute_url}"
                        )),
                    )
                    .into());
                } else {
                    property_attrs.push((
                        self.parse_iri(attribute_url)?,
                        self.convert_attribute(&attribute)?,
                    ));
                }
            }
        }

        // Parsing with the base IRI
        let id_attr = match id_attr {
            Some(iri) => {
                let iri = self.resolve_iri(&base_iri, iri)?;
                if !self.lenient {
                    if self.known_rdf_id.contains(iri.as_str()) {
                        return Err(RdfXmlSyntaxError::new(
                            RdfXmlSyntaxErrorKind::DuplicateRdfId(iri.as_str().to_owned()),
                        )
                        .into());
                    }
                    self.known_rdf_id.insert(iri.as_str().into());
                }
                Some(iri)
            }
            None => None,
        };
        let about_attr = match about_attr {
            Some(attr) => Some(self.convert_iri_attribute(&base_iri, &attr)?),
            None => None,
        };
        let resource_attr = match resource_attr {
            Some(attr) => Some(self.convert_iri_attribute(&base_iri, &attr)?),
            None => None,
        };
        let datatype_attr = match datatype_attr {
            Some(attr) => Some(self.convert_iri_attribute(&base_iri, &attr)?),
            None => None,
        };
        let type_attr = match type_attr {
            Some(attr) => Some(self.convert_iri_attribute(&base_iri, &attr)?),
            None => None,
        };

        let expected_production = match self.state.last() {
            Some(RdfXmlState::Doc { .. }) => RdfXmlNextProduction::Rdf,
            Some(
                RdfXmlState::Rdf { .. }
                | RdfXmlState::PropertyElt { .. }
                | RdfXmlState::ParseTypeCollectionPropertyElt { .. },
            ) => RdfXmlNextProduction::NodeElt,
            Some(RdfXmlState::NodeElt { subject, .. }) => RdfXmlNextProduction::PropertyElt {
                subject: subject.clone(),
            },
            Some(RdfXmlState::ParseTypeLiteralPropertyElt { .. }) => {
                return Err(RdfXmlSyntaxError::msg(
                    "ParseTypeLiteralPropertyElt production children should never be considered as a RDF/XML content"
                ).into());
            }
            None => {
                return Err(RdfXmlSyntaxError::msg(
                    "No state in the stack: the XML is not balanced",
                )
                .into());
            }
        };

        let new_state = match expected_production {
            RdfXmlNextProduction::Rdf => {
                if *tag_name == *RDF_RDF {
                    RdfXmlState::Rdf { base_iri, language }
                } else if RESERVED_RDF_ELEMENTS.contains(&&*tag_name) {
                    return Err(RdfXmlSyntaxError::new(
                        RdfXmlSyntaxErrorKind::ForbiddenRdfConstruct(format!(
                            "the node element {tag_name}"
                        )),
                    )
                    .into());
                } else {
                    self.build_node_elt(
                        self.parse_iri(tag_name)?,
                        base_iri,
                        language,
                        id_attr,
                        node_id_attr,
                        about_attr,
                        type_attr,
                        property_attrs,
                        results,
                    )?
                }
            }
            RdfXmlNextProduction::NodeElt => {
                if RESERVED_RDF_ELEMENTS.contains(&&*tag_name) {
                    return Err(RdfXmlSyntaxError::new(
                        RdfXmlSyntaxErrorKind::ForbiddenRdfConstruct(format!(
                            "the node element {tag_name}"
                        )),
                    )
                    .into());
                }
                self.build_node_elt(
                    self.parse_iri(tag_name)?,
                    base_iri,
                    language,
                    id_attr,
                    node_id_attr,
                    about_attr,
                    type_attr,
                    property_attrs,
                    results,
                )?
            }
            RdfXmlNextProduction::PropertyElt { subject } => {
                let iri = if *tag_name == *RDF_LI {
                    let Some(RdfXmlState::NodeElt { li_counter, .. }) = self.state.last_mut()
                    else {
                        return Err(RdfXmlSyntaxError::new(
                            RdfXmlSyntaxErrorKind::ForbiddenRdfConstruct(format!(
                                "the property element {tag_name}"
                            )),
                        )
                        .into());
                    };
                    *li_counter += 1;
                    NamedNode::new_unchecked(format!(
                        "http://www.w3.org/1999/02/22-rdf-syntax-ns#_{li_counter}"
                    ))
                } else if RESERVED_RDF_ELEMENTS.contains(&&*tag_name)
                    || *tag_name == *RDF_DESCRIPTION
                {
                    return Err(RdfXmlSyntaxError::new(
                        RdfXmlSyntaxErrorKind::ForbiddenRdfConstruct(format!(
                            "the property element {tag_name}"
                        )),
                    )
                    .into());
                } else {
                    self.parse_iri(tag_name)?
                };
                match parse_type {
                    RdfXmlParseType::Default => {
                        if resource_attr.is_some()
                            || node_id_attr.is_some()
                            || !property_attrs.is_empty()
                        {
                            let object: Subject = match (resource_attr, node_id_attr) {
                                (Some(resource_attr), None) => resource_attr.into(),
                                (None, Some(node_id_attr)) => node_id_attr.into(),
                                (None, None) => self.blank_nodes.fresh().into(),
                                (Some(_), Some(_)) => {
                                    return Err(RdfXmlSyntaxError::msg(
                                        "Not both rdf:resource and rdf:nodeID could be set at the same time",
                                    ).into());
                                }
                            };
                            Self::emit_property_attrs(
                                &object,
                                property_attrs,
                                &language,
                                results,
                            );
                            if let Some(type_attr) = type_attr {
                                results.push_back(Triple::new(
                                    object.clone(),
                                    rdf::TYPE,
                                    type_attr,
                                ));
                            }
                            RdfXmlState::PropertyElt {
                                iri,
                                base_iri,
                                language,
                                subject,
                                object: Some(NodeOrText::Node(object)),
                                id_attr,
                                datatype_attr,
                            }
                        } else {
                            RdfXmlState::PropertyElt {
                                iri,
                                base_iri,
                                language,
                                subject,
                                object: None,
                                id_attr,
                                datatype_attr,
                            }
                        }
                    }
                    RdfXmlParseType::Literal | RdfXmlParseType::Other => {
                        // Unknown parseType values behave like "Literal"
                        if resource_attr.is_some()
                            || node_id_attr.is_some()
                            || datatype_attr.is_some()
                            || !property_attrs.is_empty()
                        {
                            return Err(RdfXmlSyntaxError::new(
                                RdfXmlSyntaxErrorKind::InvalidParseTypeCombination,
                            )
                            .into());
                        }
                        RdfXmlState::ParseTypeLiteralPropertyElt {
                            iri,
                            base_iri,
                            language,
                            subject,
                            writer: Writer::new(Vec::new()),
                            id_attr,
                        }
                    }
                    RdfXmlParseType::Resource => {
                        let object = self.blank_nodes.fresh();
                        let triple = Triple::new(subject, iri, object.clone());
                        results.push_back(triple.clone());
                        if let Some(id_attr) = &id_attr {
                            Self::reify(triple, id_attr.clone(), results);
                        }
                        RdfXmlState::NodeElt {
                            base_iri,
                            language,
                            subject: object.into(),
                            li_counter: 0,
                        }
                    }
                    RdfXmlParseType::Collection => RdfXmlState::ParseTypeCollectionPropertyElt {
                        iri,
                        base_iri,
                        language,
                        subject,
                        objects: Vec::new(),
                        id_attr,
                    },
                }
            }
        };
        self.state.push(new_state);
        Ok(())
    }

    fn parse_end_event(
        &mut self,
        event: &BytesEnd<'_>,
        results: &mut VecDeque<Triple>,
    ) -> Result<(), RdfXmlParseError> {
        // Literal case
        if self.in_literal_depth > 0 {
            if let Some(RdfXmlState::ParseTypeLiteralPropertyElt { writer, .. }) =
                self.state.last_mut()
            {
                writer.write_event(Event::End(BytesEnd::new(
                    self.reader.decoder().decode(event.name().as_ref())?,
                )))?;
                self.in_literal_depth -= 1;
                return Ok(());
            }
        }

        if let Some(current_state) = self.state.pop() {
            self.end_state(current_state, results)?;
        }
        Ok(())
    }

    fn parse_text_event(&mut self, event: &BytesText<'_>) -> Result<(), RdfXmlParseError> {
        let text = event.unescape_with(|e| self.resolve_entity(e))?.to_string();
        match self.state.last_mut() {
            Some(RdfXmlState::PropertyElt { object, .. }) => {
                if !event.iter().copied().all(is_whitespace) {
                    *object = Some(NodeOrText::Text(text));
                }
                Ok(())
            }
            Some(RdfXmlState::ParseTypeLiteralPropertyElt { writer, .. }) => {
                writer.write_event(Event::Text(BytesText::new(&text)))?;
                Ok(())
            }
            _ => {
                if event.iter().copied().all(is_whitespace) {
                    Ok(())
                } else {
                    Err(RdfXmlSyntaxError::msg(format!("Unexpected text event: '{text}'")).into())
                }
            }
        }
    }

    /// Rebuilds the start tag of an element inside an XML literal.
    ///
    /// The in-scope namespace declarations of the outer document are pushed
    /// down onto the top-level elements of the literal, and declarations and
    /// attributes are written in name order so that attribute order in the
    /// source does not leak into the literal value.
    fn canonical_literal_start(
        &self,
        event: &BytesStart<'_>,
    ) -> Result<BytesStart<'static>, RdfXmlParseError> {
        let name = self
            .reader
            .decoder()
            .decode(event.name().as_ref())?
            .to_string();
        let mut declarations = BTreeMap::new();
        let mut attributes = Vec::new();
        let mut declared_here = HashSet::new();
        for attribute in event.attributes() {
            let attribute = attribute.map_err(Error::InvalidAttr)?;
            let key = self
                .reader
                .decoder()
                .decode(attribute.key.as_ref())?
                .to_string();
            let value = attribute
                .decode_and_unescape_value_with(&self.reader, |e| self.resolve_entity(e))?
                .to_string();
            if key == "xmlns" || key.starts_with("xmlns:") {
                declared_here.insert(key.clone());
                declarations.insert(key, value);
            } else {
                attributes.push((key, value));
            }
        }
        if self.in_literal_depth == 0 {
            // Top-level element of the literal: pull the outer declarations in
            for (depth, prefix, iri) in &self.namespaces {
                if *depth >= self.depth {
                    continue; // Declared on this very element, already there
                }
                let key = if prefix.is_empty() {
                    "xmlns".to_owned()
                } else {
                    format!("xmlns:{prefix}")
                };
                if !declared_here.contains(&key) {
                    declarations.insert(key, iri.clone());
                }
            }
        }
        attributes.sort();
        let mut clean_event = BytesStart::new(name);
        for (key, value) in &declarations {
            clean_event.push_attribute((key.as_str(), value.as_str()));
        }
        for (key, value) in &attributes {
            clean_event.push_attribute((key.as_str(), value.as_str()));
        }
        Ok(clean_event)
    }

    fn resolve_tag_name(&self, qname: QName<'_>) -> Result<String, RdfXmlParseError> {
        let (namespace, local_name) = self.reader.resolve_element(qname);
        self.resolve_ns_name(namespace, local_name)
    }

    fn resolve_attribute_name(&self, qname: QName<'_>) -> Result<String, RdfXmlParseError> {
        let (namespace, local_name) = self.reader.resolve_attribute(qname);
        self.resolve_ns_name(namespace, local_name)
    }

    fn resolve_ns_name(
        &self,
        namespace: ResolveResult<'_>,
        local_name: LocalName<'_>,
    ) -> Result<String, RdfXmlParseError> {
        match namespace {
            ResolveResult::Bound(ns) => {
                let mut value = Vec::with_capacity(ns.as_ref().len() + local_name.as_ref().len());
                value.extend_from_slice(ns.as_ref());
                value.extend_from_slice(local_name.as_ref());
                Ok(unescape_with(&self.reader.decoder().decode(&value)?, |e| {
                    self.resolve_entity(e)
                })
                .map_err(Error::from)?
                .to_string())
            }
            ResolveResult::Unbound => {
                Err(RdfXmlSyntaxError::msg("XML namespaces are required in RDF/XML").into())
            }
            ResolveResult::Unknown(v) => Err(RdfXmlSyntaxError::msg(format!(
                "Unknown prefix {}:",
                self.reader.decoder().decode(&v)?
            ))
            .into()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build_node_elt(
        &mut self,
        iri: NamedNode,
        base_iri: Option<Iri<String>>,
        language: Option<String>,
        id_attr: Option<NamedNode>,
        node_id_attr: Option<BlankNode>,
        about_attr: Option<NamedNode>,
        type_attr: Option<NamedNode>,
        property_attrs: Vec<(NamedNode, String)>,
        results: &mut VecDeque<Triple>,
    ) -> Result<RdfXmlState, RdfXmlSyntaxError> {
        let subject: Subject = match (id_attr, node_id_attr, about_attr) {
            (Some(id_attr), None, None) => id_attr.into(),
            (None, Some(node_id_attr), None) => node_id_attr.into(),
            (None, None, Some(about_attr)) => about_attr.into(),
            (None, None, None) => self.blank_nodes.fresh().into(),
            (Some(_), Some(_), _) => {
                return Err(RdfXmlSyntaxError::msg(
                    "Not both rdf:ID and rdf:nodeID could be set at the same time",
                ));
            }
            (_, Some(_), Some(_)) => {
                return Err(RdfXmlSyntaxError::msg(
                    "Not both rdf:nodeID and rdf:about could be set at the same time",
                ));
            }
            (Some(_), _, Some(_)) => {
                return Err(RdfXmlSyntaxError::msg(
                    "Not both rdf:ID and rdf:about could be set at the same time",
                ));
            }
        };

        Self::emit_property_attrs(&subject, property_attrs, &language, results);

        if let Some(type_attr) = type_attr {
            results.push_back(Triple::new(subject.clone(), rdf::TYPE, type_attr));
        }

        if iri != *RDF_DESCRIPTION {
            results.push_back(Triple::new(subject.clone(), rdf::TYPE, iri));
        }
        Ok(RdfXmlState::NodeElt {
            base_iri,
            language,
            subject,
            li_counter: 0,
        })
    }

    fn end_state(
        &mut self,
        state: RdfXmlState,
        results: &mut VecDeque<Triple>,
    ) -> Result<(), RdfXmlSyntaxError> {
        match state {
            RdfXmlState::PropertyElt {
                iri,
                language,
                subject,
                id_attr,
                datatype_attr,
                object,
                ..
            } => {
                let object = match object {
                    Some(NodeOrText::Node(node)) => Term::from(node),
                    Some(NodeOrText::Text(text)) => {
                        Self::new_literal(text, language, datatype_attr).into()
                    }
                    None => Self::new_literal(String::new(), language, datatype_attr).into(),
                };
                let triple = Triple::new(subject, iri, object);
                results.push_back(triple.clone());
                if let Some(id_attr) = id_attr {
                    Self::reify(triple, id_attr, results);
                }
            }
            RdfXmlState::ParseTypeCollectionPropertyElt {
                iri,
                subject,
                id_attr,
                objects,
                ..
            } => {
                let nodes: Vec<Subject> = objects
                    .iter()
                    .map(|_| self.blank_nodes.fresh().into())
                    .collect();
                // The rdf:first/rdf:rest chain comes out head to tail
                for (i, object) in objects.into_iter().enumerate() {
                    results.push_back(Triple::new(nodes[i].clone(), rdf::FIRST, object));
                    let rest: Term = match nodes.get(i + 1) {
                        Some(next) => next.clone().into(),
                        None => rdf::NIL.into(),
                    };
                    results.push_back(Triple::new(nodes[i].clone(), rdf::REST, rest));
                }
                let head: Term = match nodes.first() {
                    Some(head) => head.clone().into(),
                    None => rdf::NIL.into(),
                };
                let triple = Triple::new(subject, iri, head);
                results.push_back(triple.clone());
                if let Some(id_attr) = id_attr {
                    Self::reify(triple, id_attr, results);
                }
            }
            RdfXmlState::ParseTypeLiteralPropertyElt {
                iri,
                subject,
                id_attr,
                writer,
                ..
            } => {
                let object = writer.into_inner();
                let triple = Triple::new(
                    subject,
                    iri,
                    Literal::new_typed_literal(
                        str::from_utf8(&object).map_err(|_| {
                            RdfXmlSyntaxError::msg("The XML literal is not in valid UTF-8")
                        })?,
                        rdf::XML_LITERAL,
                    ),
                );
                results.push_back(triple.clone());
                if let Some(id_attr) = id_attr {
                    Self::reify(triple, id_attr, results);
                }
            }
            RdfXmlState::NodeElt { subject, .. } => match self.state.last_mut() {
                Some(RdfXmlState::PropertyElt { object, .. }) => {
                    *object = Some(NodeOrText::Node(subject))
                }
                Some(RdfXmlState::ParseTypeCollectionPropertyElt { objects, .. }) => {
                    objects.push(subject)
                }
                _ => (),
            },
            _ => (),
        }
        Ok(())
    }

    fn new_literal(
        value: String,
        language: Option<String>,
        datatype: Option<NamedNode>,
    ) -> Literal {
        if let Some(datatype) = datatype {
            Literal::new_typed_literal(value, datatype)
        } else if let Some(language) = language {
            Literal::new_language_tagged_literal_unchecked(value, language)
        } else {
            Literal::new_simple_literal(value)
        }
    }

    /// The four reification triples, following the asserted statement they describe.
    fn reify(triple: Triple, statement_id: NamedNode, results: &mut VecDeque<Triple>) {
        results.push_back(Triple::new(
            statement_id.clone(),
            rdf::TYPE,
            rdf::STATEMENT,
        ));
        results.push_back(Triple::new(
            statement_id.clone(),
            rdf::SUBJECT,
            triple.subject,
        ));
        results.push_back(Triple::new(
            statement_id.clone(),
            rdf::PREDICATE,
            triple.predicate,
        ));
        results.push_back(Triple::new(statement_id, rdf::OBJECT, triple.object));
    }

    fn emit_property_attrs(
        subject: &Subject,
        literal_attributes: Vec<(NamedNode, String)>,
        language: &Option<String>,
        results: &mut VecDeque<Triple>,
    ) {
        for (literal_predicate, literal_value) in literal_attributes {
            results.push_back(Triple::new(
                subject.clone(),
                literal_predicate,
                if let Some(language) = language.clone() {
                    Literal::new_language_tagged_literal_unchecked(literal_value, language)
                } else {
                    Literal::new_simple_literal(literal_value)
                },
            ));
        }
    }

    fn convert_attribute(&self, attribute: &Attribute<'_>) -> Result<String, RdfXmlParseError> {
        Ok(attribute
            .decode_and_unescape_value_with(&self.reader, |e| self.resolve_entity(e))?
            .into_owned())
    }

    fn convert_iri_attribute(
        &self,
        base_iri: &Option<Iri<String>>,
        attribute: &Attribute<'_>,
    ) -> Result<NamedNode, RdfXmlParseError> {
        Ok(self.resolve_iri(base_iri, self.convert_attribute(attribute)?)?)
    }

    fn resolve_iri(
        &self,
        base_iri: &Option<Iri<String>>,
        relative_iri: String,
    ) -> Result<NamedNode, RdfXmlSyntaxError> {
        if let Some(base_iri) = base_iri {
            Ok(NamedNode::new_unchecked(
                if self.lenient {
                    Ok(base_iri.resolve_unchecked(&relative_iri))
                } else {
                    base_iri.resolve(&relative_iri)
                }
                .map_err(|error| {
                    RdfXmlSyntaxError::new(RdfXmlSyntaxErrorKind::InvalidIri {
                        iri: relative_iri,
                        error,
                    })
                })?
                .into_inner(),
            ))
        } else {
            self.parse_iri(relative_iri)
        }
    }

    fn parse_iri(&self, relative_iri: String) -> Result<NamedNode, RdfXmlSyntaxError> {
        Ok(NamedNode::new_unchecked(if self.lenient {
            relative_iri
        } else {
            if let Err(error) = Iri::parse(relative_iri.as_str()) {
                return Err(RdfXmlSyntaxError::new(RdfXmlSyntaxErrorKind::InvalidIri {
                    iri: relative_iri,
                    error,
                }));
            }
            relative_iri
        }))
    }

    fn resolve_entity(&self, e: &str) -> Option<&str> {
        self.custom_entities.get(e).map(String::as_str)
    }
}
