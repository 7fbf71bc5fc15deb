use std::error;
use std::fmt;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use crate::token::{QName, Token, TokenAttribute, TokenSource};
use crate::tokenizer::TokenStream;
use crate::{Attribute, Document, Namespace, NodeData, NodeId};

/// A list of all possible errors.
#[derive(Debug)]
pub enum Error {
    /// An end-element token arrived while no element was open.
    UnexpectedCloseTag,

    /// The token source failed before signaling a clean end-of-input.
    ///
    /// Carries the underlying cause. No partial document is returned.
    Source(Box<dyn error::Error>),
}

impl From<xmlparser::Error> for Error {
    fn from(e: xmlparser::Error) -> Self {
        Error::Source(Box::new(e))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::UnexpectedCloseTag => {
                write!(f, "unexpected close tag: no element is open")
            }
            Error::Source(ref err) => {
                write!(f, "the token source failed: {}", err)
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Source(ref err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl Document {
    /// Parses the input XML string.
    ///
    /// Shorthand for running [`Document::from_tokens`] over a
    /// [`TokenStream`].
    ///
    /// # Examples
    ///
    /// ```
    /// let doc = xmldom::Document::parse("<e/>").unwrap();
    /// assert_eq!(doc.root().unwrap().name(), "e");
    /// ```
    ///
    /// [`Document::from_tokens`]: struct.Document.html#method.from_tokens
    /// [`TokenStream`]: struct.TokenStream.html
    pub fn parse(text: &str) -> Result<Document, Error> {
        Document::from_tokens(TokenStream::new(text))
    }

    /// Reads a file to a string and parses it.
    ///
    /// I/O failures are reported as [`Error::Source`].
    ///
    /// [`Error::Source`]: enum.Error.html#variant.Source
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document, Error> {
        let text = fs::read_to_string(path).map_err(|e| Error::Source(Box::new(e)))?;
        Document::parse(&text)
    }

    /// Consumes a token source to completion and returns the finished tree.
    ///
    /// A single pass with one piece of mutable state: the currently open
    /// element. Each token kind performs a fixed transition:
    ///
    /// - a start element pushes one level and becomes the root if none is
    ///   set yet. Its namespace URI is resolved against the declarations
    ///   recorded so far, except for the very first element: its own
    ///   `xmlns` attributes have not been scanned at that point, so the
    ///   root element never carries a namespace reference.
    /// - an end element pops to the parent; with no element open this is
    ///   [`Error::UnexpectedCloseTag`].
    /// - character data replaces the text of the open element (last write
    ///   wins); outside of any element it is discarded.
    /// - a processing instruction replaces the previously stored one, a
    ///   directive is appended.
    ///
    /// Reaching end-of-input with elements still open is not an error:
    /// the tree built so far is returned.
    ///
    /// [`Error::UnexpectedCloseTag`]: enum.Error.html#variant.UnexpectedCloseTag
    pub fn from_tokens<S: TokenSource>(mut source: S) -> Result<Document, Error> {
        let mut doc = Document {
            root: None,
            nodes: Vec::new(),
            namespaces: Vec::new(),
            proc_inst: None,
            directives: Vec::new(),
        };

        let mut current: Option<NodeId> = None;

        while let Some(token) = source.next_token()? {
            match token {
                Token::ElementStart { name, attributes } => {
                    let id = open_element(&mut doc, current, name, attributes);
                    if doc.root.is_none() {
                        doc.root = Some(id);
                    }
                    current = Some(id);
                }
                Token::ElementEnd => {
                    current = match current {
                        Some(id) => doc.nodes[id.0].parent,
                        None => return Err(Error::UnexpectedCloseTag),
                    };
                }
                Token::Text(text) => {
                    if let Some(id) = current {
                        doc.nodes[id.0].text = Some(text);
                    }
                }
                Token::ProcessingInstruction { target, content } => {
                    doc.proc_inst = Some(match content {
                        Some(content) => format!("<?{} {}?>", target, content),
                        None => format!("<?{}?>", target),
                    });
                }
                Token::Directive(text) => {
                    doc.directives.push(format!("<!{}>", text));
                }
            }
        }

        Ok(doc)
    }

    fn append(&mut self, parent: Option<NodeId>, data: NodeData) -> NodeId {
        let new_child_id = NodeId(self.nodes.len());
        self.nodes.push(data);

        let parent_id = match parent {
            Some(id) => id,
            None => return new_child_id,
        };

        let last_child_id = self.nodes[parent_id.0].children.map(|(_, id)| id);
        self.nodes[new_child_id.0].prev_sibling = last_child_id;

        if let Some(id) = last_child_id {
            self.nodes[id.0].next_sibling = Some(new_child_id);
        }

        self.nodes[parent_id.0].children = Some(
            if let Some((first_child_id, _)) = self.nodes[parent_id.0].children {
                (first_child_id, new_child_id)
            } else {
                (new_child_id, new_child_id)
            }
        );

        new_child_id
    }
}

fn open_element(
    doc: &mut Document,
    parent: Option<NodeId>,
    name: QName,
    attributes: Vec<TokenAttribute>,
) -> NodeId {
    // The element's own declarations are recorded below, while scanning its
    // attributes. Resolving before that scan means the first element of the
    // document never finds a match: nothing has been declared yet.
    let ns = if doc.root.is_some() {
        doc.namespace_for_uri(&name.uri)
    } else {
        None
    };

    let mut attrs = Vec::new();
    for attr in attributes {
        if attr.name.uri.is_empty() && attr.name.local == "xmlns" {
            doc.namespaces.push(Rc::new(Namespace {
                prefix: String::new(),
                uri: attr.value,
            }));
        } else if attr.name.uri == "xmlns" {
            doc.namespaces.push(Rc::new(Namespace {
                prefix: attr.name.local,
                uri: attr.value,
            }));
        } else {
            // Declarations earlier in this very attribute list are already
            // visible here.
            attrs.push(Attribute {
                ns: doc.namespace_for_uri(&attr.name.uri),
                name: attr.name.local,
                value: attr.value,
            });
        }
    }

    doc.append(parent, NodeData {
        parent,
        prev_sibling: None,
        next_sibling: None,
        children: None,
        name: name.local,
        ns,
        attributes: attrs,
        text: None,
    })
}
