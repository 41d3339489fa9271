//! Minimal element tree built from the `quick-xml` event stream.
//!
//! The tree keeps local names only, direct character data (text and CDATA, concatenated in
//! document order) and attributes. The root element's inner markup is captured verbatim from
//! the source text.

use crate::{CdaError, CdaResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> CdaResult<Self> {
        let name = utf8(start.local_name().as_ref())?.to_string();

        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute
                .map_err(|e| CdaError::MalformedXml(format!("bad attribute on <{name}>: {e}")))?;
            if attribute.key.as_ref().starts_with(b"xmlns") {
                continue;
            }
            let key = utf8(attribute.key.local_name().as_ref())?.to_string();
            let value = attribute
                .unescape_value()
                .map_err(|e| CdaError::MalformedXml(format!("bad attribute value on <{name}>: {e}")))?
                .into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            text: String::new(),
            children: Vec::new(),
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Every descendant reached by following `path` one child level per segment, in document
    /// order.
    pub fn select<'a>(&'a self, path: &[&str], out: &mut Vec<&'a Element>) {
        match path.split_first() {
            None => out.push(self),
            Some((head, tail)) => {
                for child in self.children.iter().filter(|c| c.name == *head) {
                    child.select(tail, out);
                }
            }
        }
    }

    /// The first descendant reached by `path`.
    pub fn first(&self, path: &[&str]) -> Option<&Element> {
        match path.split_first() {
            None => Some(self),
            Some((head, tail)) => self
                .children
                .iter()
                .filter(|c| c.name == *head)
                .find_map(|child| child.first(tail)),
        }
    }
}

/// A parsed document: its root element plus the root's verbatim inner markup.
#[derive(Debug)]
pub(crate) struct XmlDocument {
    pub root: Element,
    pub inner_xml: String,
}

/// Parse `input` into an element tree.
///
/// # Errors
///
/// Returns [`CdaError::MalformedXml`] for any structural problem: reader errors, mismatched or
/// unclosed tags, bad escapes, content outside the root element or a missing root.
pub(crate) fn parse(input: &str) -> CdaResult<XmlDocument> {
    let mut reader = Reader::from_str(input);
    reader.trim_text(false);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut inner_start = 0usize;
    let mut inner_end = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| {
            CdaError::MalformedXml(format!("at byte {}: {e}", reader.buffer_position()))
        })?;

        match event {
            Event::Start(start) => {
                let element = Element::open(&start)?;
                if stack.is_empty() {
                    ensure_single_root(&root, &element)?;
                    inner_start = reader.buffer_position();
                }
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = Element::open(&start)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => {
                        ensure_single_root(&root, &element)?;
                        root = Some(element);
                    }
                }
            }
            Event::End(end) => {
                let name = utf8(end.local_name().as_ref())?.to_string();
                let element = stack.pop().ok_or_else(|| {
                    CdaError::MalformedXml(format!("unexpected closing tag </{name}>"))
                })?;
                if element.name != name {
                    return Err(CdaError::MalformedXml(format!(
                        "expected </{}>, found </{name}>",
                        element.name
                    )));
                }
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => {
                        // Back up from the end of the closing tag to its `</`.
                        inner_end = input
                            .get(..reader.buffer_position())
                            .and_then(|consumed| consumed.rfind("</"))
                            .unwrap_or(inner_start);
                        root = Some(element);
                    }
                }
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| CdaError::MalformedXml(format!("bad character data: {e}")))?;
                match stack.last_mut() {
                    Some(element) => element.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(CdaError::MalformedXml(
                            "character data outside the root element".into(),
                        ))
                    }
                }
            }
            Event::CData(data) => {
                let element = stack.last_mut().ok_or_else(|| {
                    CdaError::MalformedXml("CDATA section outside the root element".into())
                })?;
                element.text.push_str(utf8(&data.into_inner())?);
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes carry no model data.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(CdaError::MalformedXml(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }

    let root = root.ok_or_else(|| CdaError::MalformedXml("document has no root element".into()))?;
    let inner_xml = input
        .get(inner_start..inner_end)
        .unwrap_or_default()
        .to_string();

    Ok(XmlDocument { root, inner_xml })
}

fn ensure_single_root(root: &Option<Element>, next: &Element) -> CdaResult<()> {
    match root {
        Some(existing) => Err(CdaError::MalformedXml(format!(
            "element <{}> after the root element <{}>",
            next.name, existing.name
        ))),
        None => Ok(()),
    }
}

fn utf8(bytes: &[u8]) -> CdaResult<&str> {
    std::str::from_utf8(bytes).map_err(|e| CdaError::MalformedXml(format!("invalid UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_tree_with_local_names_and_attributes() {
        let input = r#"<?xml version="1.0"?>
<ClinicalDocument xmlns="urn:hl7-org:v3" xmlns:sdtc="urn:hl7-org:sdtc">
  <sdtc:raceCode code="2106-3"/>
  <title>Report &amp; summary</title>
</ClinicalDocument>"#;

        let doc = parse(input).expect("parse");
        assert_eq!(doc.root.name, "ClinicalDocument");
        assert!(doc.root.attributes.is_empty());

        let race = doc.root.first(&["raceCode"]).expect("race code");
        assert_eq!(race.attribute("code"), Some("2106-3"));

        let title = doc.root.first(&["title"]).expect("title");
        assert_eq!(title.text, "Report & summary");
    }

    #[test]
    fn captures_root_inner_xml_verbatim() {
        let input = "<root a=\"1\">\n  <x>1</x><y/>\n</root>";
        let doc = parse(input).expect("parse");
        assert_eq!(doc.inner_xml, "\n  <x>1</x><y/>\n");
    }

    #[test]
    fn cdata_becomes_character_data() {
        let doc = parse("<r><text><![CDATA[<table><tr/></table>]]></text></r>").expect("parse");
        let text = doc.root.first(&["text"]).expect("text");
        assert_eq!(text.text, "<table><tr/></table>");
        assert!(text.children.is_empty());
    }

    #[test]
    fn select_collects_every_match_in_order() {
        let doc = parse("<r><a><b>1</b></a><a><b>2</b><b>3</b></a></r>").expect("parse");
        let mut found = Vec::new();
        doc.root.select(&["a", "b"], &mut found);
        let values: Vec<&str> = found.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(values, vec!["1", "2", "3"]);
    }

    #[test]
    fn rejects_mismatched_tags() {
        let err = parse("<r><a></b></r>").expect_err("should reject mismatched tags");
        assert!(matches!(err, CdaError::MalformedXml(_)));
    }

    #[test]
    fn rejects_unclosed_root() {
        let err = parse("<r><a></a>").expect_err("should reject unclosed root");
        assert!(matches!(err, CdaError::MalformedXml(_)));
    }

    #[test]
    fn rejects_empty_input() {
        let err = parse("   ").expect_err("should reject empty input");
        assert!(matches!(err, CdaError::MalformedXml(msg) if msg.contains("no root")));
    }

    #[test]
    fn rejects_second_root() {
        let err = parse("<a/><b/>").expect_err("should reject second root");
        assert!(matches!(err, CdaError::MalformedXml(_)));
    }
}
