//! A [`TokenSource`] backed by the `xmlparser` crate.
//!
//! `xmlparser` reports names as raw prefix/local pairs; this adapter keeps a
//! scoped prefix-to-URI binding stack and hands the builder fully resolved
//! qualified names, as the token contract requires. Namespace declarations
//! are *also* passed through as raw attributes (with the `xmlns` URI
//! sentinel), since recording them on the document is the builder's job.
//!
//! [`TokenSource`]: trait.TokenSource.html

use std::mem;

use xmlparser::{ElementEnd, ExternalId, StrSpan};

use crate::parse::Error;
use crate::token::{QName, Token, TokenAttribute, TokenSource};
use crate::NS_XML_URI;

/// Streams tokens from raw XML text.
///
/// Comments are dropped, CDATA becomes character data as is, the XML
/// declaration is reported as a processing instruction with target `xml`,
/// and a `DOCTYPE` becomes a directive token. Predefined entity and
/// character references in text and attribute values are expanded; unknown
/// entity references are left as written.
pub struct TokenStream<'input> {
    tokenizer: xmlparser::Tokenizer<'input>,
    bindings: Vec<Binding>,
    frames: Vec<usize>,
    pending_name: Option<(String, String)>,
    pending_attrs: Vec<RawAttr>,
    queued_end: bool,
}

struct Binding {
    prefix: String,
    uri: String,
}

struct RawAttr {
    prefix: String,
    local: String,
    value: String,
}

impl<'input> TokenStream<'input> {
    /// Creates a token stream over an XML string.
    pub fn new(text: &'input str) -> TokenStream<'input> {
        TokenStream {
            tokenizer: xmlparser::Tokenizer::from(text),
            bindings: Vec::new(),
            frames: Vec::new(),
            pending_name: None,
            pending_attrs: Vec::new(),
            queued_end: false,
        }
    }

    fn resolve(&self, prefix: &str) -> String {
        // The 'xml' prefix is bound by definition and never declared.
        if prefix == "xml" {
            return NS_XML_URI.to_string();
        }

        self.bindings
            .iter()
            .rev()
            .find(|b| b.prefix == prefix)
            .map(|b| b.uri.clone())
            .unwrap_or_default()
    }

    fn finish_element(&mut self, empty: bool) -> Token {
        let (prefix, local) = self.pending_name.take().unwrap_or_default();
        let raw_attrs = mem::replace(&mut self.pending_attrs, Vec::new());

        // Declarations on this element are in scope for the element itself
        // and for its own attributes, so bind them before resolving.
        self.frames.push(self.bindings.len());
        for attr in &raw_attrs {
            if attr.prefix == "xmlns" {
                self.bindings.push(Binding {
                    prefix: attr.local.clone(),
                    uri: attr.value.clone(),
                });
            } else if attr.prefix.is_empty() && attr.local == "xmlns" {
                self.bindings.push(Binding {
                    prefix: String::new(),
                    uri: attr.value.clone(),
                });
            }
        }

        let attributes = raw_attrs
            .into_iter()
            .map(|attr| {
                let uri = if attr.prefix == "xmlns" {
                    "xmlns".to_string()
                } else if attr.prefix.is_empty() {
                    // Unprefixed attributes take no namespace, not even the
                    // default one; `xmlns` itself stays unqualified too.
                    String::new()
                } else {
                    self.resolve(&attr.prefix)
                };

                TokenAttribute {
                    name: QName { uri, local: attr.local },
                    value: attr.value,
                }
            })
            .collect();

        let uri = self.resolve(&prefix);
        self.queued_end = empty;

        Token::ElementStart { name: QName { uri, local }, attributes }
    }

    fn pop_scope(&mut self) {
        if let Some(mark) = self.frames.pop() {
            self.bindings.truncate(mark);
        }
    }
}

impl<'input> TokenSource for TokenStream<'input> {
    fn next_token(&mut self) -> Result<Option<Token>, Error> {
        if self.queued_end {
            self.queued_end = false;
            self.pop_scope();
            return Ok(Some(Token::ElementEnd));
        }

        while let Some(token) = self.tokenizer.next() {
            match token? {
                xmlparser::Token::ElementStart { prefix, local, .. } => {
                    self.pending_name = Some((
                        prefix.as_str().to_string(),
                        local.as_str().to_string(),
                    ));
                    self.pending_attrs.clear();
                }
                xmlparser::Token::Attribute { prefix, local, value, .. } => {
                    self.pending_attrs.push(RawAttr {
                        prefix: prefix.as_str().to_string(),
                        local: local.as_str().to_string(),
                        value: unescape(value.as_str()),
                    });
                }
                xmlparser::Token::ElementEnd { end, .. } => match end {
                    ElementEnd::Open => {
                        return Ok(Some(self.finish_element(false)));
                    }
                    ElementEnd::Empty => {
                        return Ok(Some(self.finish_element(true)));
                    }
                    ElementEnd::Close(..) => {
                        self.pop_scope();
                        return Ok(Some(Token::ElementEnd));
                    }
                },
                xmlparser::Token::Text { text } => {
                    return Ok(Some(Token::Text(unescape(text.as_str()))));
                }
                xmlparser::Token::Cdata { text, .. } => {
                    return Ok(Some(Token::Text(text.as_str().to_string())));
                }
                xmlparser::Token::ProcessingInstruction { target, content, .. } => {
                    return Ok(Some(Token::ProcessingInstruction {
                        target: target.as_str().to_string(),
                        content: content.map(|c| c.as_str().to_string()),
                    }));
                }
                xmlparser::Token::Declaration { version, encoding, standalone, .. } => {
                    // The XML declaration is lexically a processing
                    // instruction with the target 'xml'; report it as one.
                    let mut content = format!("version=\"{}\"", version.as_str());
                    if let Some(encoding) = encoding {
                        content.push_str(&format!(" encoding=\"{}\"", encoding.as_str()));
                    }
                    if let Some(standalone) = standalone {
                        content.push_str(&format!(
                            " standalone=\"{}\"",
                            if standalone { "yes" } else { "no" }
                        ));
                    }

                    return Ok(Some(Token::ProcessingInstruction {
                        target: "xml".to_string(),
                        content: Some(content),
                    }));
                }
                xmlparser::Token::DtdStart { name, external_id, .. }
                | xmlparser::Token::EmptyDtd { name, external_id, .. } => {
                    return Ok(Some(Token::Directive(doctype_text(name, external_id))));
                }
                xmlparser::Token::Comment { .. }
                | xmlparser::Token::EntityDeclaration { .. }
                | xmlparser::Token::DtdEnd { .. } => {}
            }
        }

        Ok(None)
    }
}

fn doctype_text(name: StrSpan, external_id: Option<ExternalId>) -> String {
    match external_id {
        Some(ExternalId::System(uri)) => {
            format!("DOCTYPE {} SYSTEM \"{}\"", name.as_str(), uri.as_str())
        }
        Some(ExternalId::Public(public_id, uri)) => {
            format!(
                "DOCTYPE {} PUBLIC \"{}\" \"{}\"",
                name.as_str(),
                public_id.as_str(),
                uri.as_str()
            )
        }
        None => format!("DOCTYPE {}", name.as_str()),
    }
}

/// Expands character references and the five predefined entities.
fn unescape(text: &str) -> String {
    if !text.as_bytes().contains(&b'&') {
        return text.to_string();
    }

    let mut buf = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        buf.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match consume_reference(tail) {
            Some((c, len)) => {
                buf.push(c);
                rest = &tail[len..];
            }
            None => {
                // Not a recognized reference; keep the text as written.
                buf.push('&');
                rest = &tail[1..];
            }
        }
    }
    buf.push_str(rest);

    buf
}

/// Parses a reference at the start of `text` (which begins with `&`).
///
/// Returns the referenced character and the reference length in bytes.
fn consume_reference(text: &str) -> Option<(char, usize)> {
    let end = text.find(';')?;
    let name = &text[1..end];

    let c = if let Some(hex) = name.strip_prefix("#x") {
        std::char::from_u32(u32::from_str_radix(hex, 16).ok()?)?
    } else if let Some(decimal) = name.strip_prefix('#') {
        std::char::from_u32(decimal.parse().ok()?)?
    } else {
        match name {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "apos" => '\'',
            "quot" => '"',
            _ => return None,
        }
    };

    Some((c, end + 1))
}
