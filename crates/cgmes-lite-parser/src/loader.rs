// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Document loader
//!
//! Turns raw XML into a generic, namespace-resolved [`RawElement`] tree using
//! quick-xml's streaming namespace reader. Only well-formedness is checked
//! here; what the elements mean is the extractor's business.

use cgmes_lite_model::{ParseError, QualifiedName, RawElement, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use std::path::Path;

/// Decode document bytes as UTF-8, dropping a leading byte order mark
pub fn decode(bytes: &[u8]) -> Result<&str> {
    let text = std::str::from_utf8(bytes).map_err(|e| ParseError::Encoding(e.to_string()))?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

/// Load a document from raw bytes
pub fn load_bytes(bytes: &[u8]) -> Result<RawElement> {
    load_str(decode(bytes)?)
}

/// Load a document from a file
pub fn load_path(path: impl AsRef<Path>) -> Result<RawElement> {
    let bytes = std::fs::read(path)?;
    load_bytes(&bytes)
}

/// Load a document from text
pub fn load_str(text: &str) -> Result<RawElement> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = NsReader::from_str(text);
    reader.config_mut().trim_text(true);

    // Open elements, innermost last
    let mut stack: Vec<RawElement> = Vec::new();
    let mut root: Option<RawElement> = None;

    loop {
        let position = reader.buffer_position() as u64;
        let (namespace, event) = match reader.read_resolved_event() {
            Ok((resolved, event)) => (namespace_uri(&resolved), event),
            Err(e) => return Err(ParseError::xml(position, e.to_string())),
        };

        match event {
            Event::Start(start) => {
                let element = open_element(&reader, &start, namespace, position)?;
                stack.push(element);
            }
            Event::Empty(start) => {
                let element = open_element(&reader, &start, namespace, position)?;
                attach(&mut stack, &mut root, element, position)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ParseError::xml(position, "closing tag without opening tag"))?;
                attach(&mut stack, &mut root, element, position)?;
            }
            Event::Text(text) => {
                let value = text
                    .unescape()
                    .map_err(|e| ParseError::xml(position, e.to_string()))?;
                append_text(&mut stack, &value, position)?;
            }
            Event::CData(data) => {
                append_text(&mut stack, &String::from_utf8_lossy(&data), position)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(innermost) = stack.last() {
        return Err(ParseError::UnexpectedEof {
            open: stack.len(),
            innermost: innermost.name.local.clone(),
        });
    }

    root.ok_or(ParseError::Empty)
}

/// Namespace URI of a resolved name, if bound
fn namespace_uri(resolved: &ResolveResult<'_>) -> Option<String> {
    match resolved {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        ResolveResult::Unbound => None,
        ResolveResult::Unknown(prefix) => {
            log::debug!(
                "Undeclared namespace prefix {:?}",
                String::from_utf8_lossy(prefix)
            );
            None
        }
    }
}

/// Build an element from a start tag, resolving attribute namespaces
fn open_element(
    reader: &NsReader<&[u8]>,
    start: &BytesStart<'_>,
    namespace: Option<String>,
    position: u64,
) -> Result<RawElement> {
    let local = utf8(start.local_name().as_ref(), position)?;
    let mut element = RawElement::new(QualifiedName { namespace, local });

    for attr in start.attributes() {
        let attr = attr.map_err(|e| ParseError::xml(position, e.to_string()))?;

        // xmlns / xmlns:prefix declarations are consumed by the reader
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }

        let (resolved, local) = reader.resolve_attribute(attr.key);
        let name = QualifiedName {
            namespace: namespace_uri(&resolved),
            local: utf8(local.as_ref(), position)?,
        };
        let value = attr
            .unescape_value()
            .map_err(|e| ParseError::xml(position, e.to_string()))?;
        element.attributes.push((name, value.into_owned()));
    }

    Ok(element)
}

/// Attach a finished element to its parent, or make it the root
fn attach(
    stack: &mut [RawElement],
    root: &mut Option<RawElement>,
    element: RawElement,
    position: u64,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(ParseError::xml(
            position,
            format!("second root element <{}>", element.name.local),
        )),
    }
}

fn append_text(stack: &mut [RawElement], value: &str, position: u64) -> Result<()> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    match stack.last_mut() {
        Some(current) => {
            current
                .text
                .get_or_insert_with(String::new)
                .push_str(value);
            Ok(())
        }
        None => Err(ParseError::xml(
            position,
            format!("text {:?} outside the root element", value),
        )),
    }
}

fn utf8(bytes: &[u8], position: u64) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| ParseError::xml(position, e.to_string()))
}
