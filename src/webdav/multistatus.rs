/*!
 * Parser for WebDAV multi-status (207) directory listings
 *
 * Only the properties the client asks for are extracted: href, displayname,
 * getcontentlength and whether resourcetype contains a collection.
 */

use log::trace;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use thiserror::Error;

/// Errors raised while parsing a multi-status body
#[derive(Debug, Error)]
pub enum MultiStatusError {
    #[error("Malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Unterminated element: {0}")]
    Unterminated(String),
}

/// One `<d:response>` element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiStatusEntry {
    /// Percent-decoded href
    pub href: String,
    pub display_name: Option<String>,
    pub content_length: Option<u64>,
    pub is_collection: bool,
    /// Whether the response carried a `<d:prop>` at all
    pub has_props: bool,
}

#[derive(Default)]
struct PartialEntry {
    href: String,
    display_name: String,
    content_length: String,
    is_collection: bool,
    has_props: bool,
}

impl PartialEntry {
    fn finish(self) -> MultiStatusEntry {
        let href = self.href.trim().to_string();
        let href = urlencoding::decode(&href)
            .map(|decoded| decoded.into_owned())
            .unwrap_or(href);
        let display_name = self.display_name.trim();

        MultiStatusEntry {
            href,
            display_name: if display_name.is_empty() { None } else { Some(display_name.to_string()) },
            content_length: self.content_length.trim().parse().ok(),
            is_collection: self.is_collection,
            has_props: self.has_props,
        }
    }
}

/// Local name of an element in the DAV: namespace (or without namespace), empty otherwise
fn dav_name(ns: &ResolveResult, local: &[u8]) -> String {
    let in_dav = match ns {
        ResolveResult::Bound(Namespace(uri)) => *uri == &b"DAV:"[..],
        ResolveResult::Unbound => true,
        ResolveResult::Unknown(_) => false,
    };
    if in_dav {
        String::from_utf8_lossy(local).to_lowercase()
    } else {
        String::new()
    }
}

fn parent_is(stack: &[String], name: &str) -> bool {
    stack.len() >= 2 && stack[stack.len() - 2] == name
}

/// Parse a multi-status body into its response entries, in document order
///
/// An empty body yields no entries.
pub fn parse_multistatus(xml: &str) -> Result<Vec<MultiStatusEntry>, MultiStatusError> {
    let mut entries = Vec::new();
    if xml.trim().is_empty() {
        return Ok(entries);
    }

    let mut reader = NsReader::from_str(xml);
    let mut stack: Vec<String> = Vec::new();
    let mut current: Option<PartialEntry> = None;

    loop {
        let (ns, event) = reader.read_resolved_event()?;
        match event {
            Event::Start(e) => {
                let name = dav_name(&ns, e.local_name().as_ref());
                match name.as_str() {
                    "response" => current = Some(PartialEntry::default()),
                    "prop" => {
                        if let Some(entry) = current.as_mut() {
                            entry.has_props = true;
                        }
                    }
                    "collection" if stack.last().map(String::as_str) == Some("resourcetype") => {
                        if let Some(entry) = current.as_mut() {
                            entry.is_collection = true;
                        }
                    }
                    _ => {}
                }
                stack.push(name);
            }
            Event::Empty(e) => {
                let name = dav_name(&ns, e.local_name().as_ref());
                if let Some(entry) = current.as_mut() {
                    match name.as_str() {
                        "collection" if stack.last().map(String::as_str) == Some("resourcetype") => {
                            entry.is_collection = true;
                        }
                        "prop" => entry.has_props = true,
                        _ => {}
                    }
                }
            }
            Event::Text(text) => {
                if let Some(entry) = current.as_mut() {
                    let text = text.unescape()?;
                    match stack.last().map(String::as_str) {
                        Some("href") if parent_is(&stack, "response") => entry.href.push_str(&text),
                        Some("displayname") => entry.display_name.push_str(&text),
                        Some("getcontentlength") => entry.content_length.push_str(&text),
                        _ => {}
                    }
                }
            }
            Event::CData(data) => {
                if let Some(entry) = current.as_mut() {
                    let text = String::from_utf8_lossy(&data.into_inner()).to_string();
                    match stack.last().map(String::as_str) {
                        Some("href") if parent_is(&stack, "response") => entry.href.push_str(&text),
                        Some("displayname") => entry.display_name.push_str(&text),
                        _ => {}
                    }
                }
            }
            Event::End(_) => {
                if stack.pop().as_deref() == Some("response") {
                    if let Some(entry) = current.take() {
                        let entry = entry.finish();
                        trace!("Parsed multi-status entry {:?}", entry);
                        entries.push(entry);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(MultiStatusError::Unterminated(stack.join("/")));
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:">
  <d:response>
    <d:href>/videos/</d:href>
    <d:propstat>
      <d:prop>
        <d:displayname>videos</d:displayname>
        <d:resourcetype><d:collection/></d:resourcetype>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/videos/Alps%20360.mp4</d:href>
    <d:propstat>
      <d:prop>
        <d:displayname>Alps 360.mp4</d:displayname>
        <d:getcontentlength>1048576</d:getcontentlength>
        <d:resourcetype/>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"#;

    #[test]
    fn test_parse_listing() {
        let entries = parse_multistatus(LISTING).unwrap();
        assert_eq!(entries.len(), 2);

        assert!(entries[0].is_collection);
        assert_eq!(entries[0].href, "/videos/");

        assert!(!entries[1].is_collection);
        assert_eq!(entries[1].href, "/videos/Alps 360.mp4");
        assert_eq!(entries[1].display_name.as_deref(), Some("Alps 360.mp4"));
        assert_eq!(entries[1].content_length, Some(1048576));
        assert!(entries[1].has_props);
    }

    #[test]
    fn test_other_prefix_and_missing_props() {
        let xml = r#"<D:multistatus xmlns:D="DAV:">
            <D:response><D:href>/a.mkv</D:href></D:response>
            <D:response><D:href>/b.mov</D:href><D:propstat><D:prop><D:getcontentlength>x</D:getcontentlength></D:prop></D:propstat></D:response>
        </D:multistatus>"#;
        let entries = parse_multistatus(xml).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(!entries[0].has_props);
        assert_eq!(entries[1].content_length, None);
        assert_eq!(entries[1].display_name, None);
    }

    #[test]
    fn test_empty_body() {
        assert!(parse_multistatus("   ").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_xml() {
        assert!(parse_multistatus("<d:multistatus xmlns:d=\"DAV:\"><d:response></d:multistatus>").is_err());
        assert!(parse_multistatus("<d:multistatus xmlns:d=\"DAV:\"><d:response>").is_err());
    }
}
