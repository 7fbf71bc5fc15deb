/*!
Build a read-only XML DOM with namespace resolution from a stream of tokens.

The tree is assembled in a single pass by [`Document::from_tokens`], which
pulls [`Token`]s from any [`TokenSource`]. For raw XML text there are the
[`Document::parse`] and [`Document::parse_file`] entry points, backed by the
[`TokenStream`] tokenizer adapter.

Namespace declarations are collected into a single document-wide list in the
order they are encountered; element and attribute namespace references are
resolved against that list at the moment the element is created.

```
let doc = xmldom::Document::parse("<e a='b'/>").unwrap();
assert_eq!(doc.root().unwrap().attribute("a"), Some("b"));
```

[`Document::from_tokens`]: struct.Document.html#method.from_tokens
[`Document::parse`]: struct.Document.html#method.parse
[`Document::parse_file`]: struct.Document.html#method.parse_file
[`Token`]: enum.Token.html
[`TokenSource`]: trait.TokenSource.html
[`TokenStream`]: struct.TokenStream.html
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::fmt;
use std::rc::Rc;

mod parse;
mod token;
mod tokenizer;

pub use crate::parse::Error;
pub use crate::token::{QName, Token, TokenAttribute, TokenSource};
pub use crate::tokenizer::TokenStream;

/// The <http://www.w3.org/XML/1998/namespace> URI.
pub const NS_XML_URI: &str = "http://www.w3.org/XML/1998/namespace";

/// An XML document tree.
///
/// Owns every [`Node`] of the tree plus the document-wide namespace
/// declaration list, the latest processing instruction and the directives.
/// A `Document` is only mutated while it is being built; afterwards the
/// whole API is read-only.
///
/// [`Node`]: struct.Node.html
pub struct Document {
    root: Option<NodeId>,
    nodes: Vec<NodeData>,
    namespaces: Vec<Rc<Namespace>>,
    proc_inst: Option<String>,
    directives: Vec<String>,
}

impl Document {
    /// Returns the root element, if the token stream contained one.
    ///
    /// # Examples
    ///
    /// ```
    /// let doc = xmldom::Document::parse("<e/>").unwrap();
    /// assert_eq!(doc.root().unwrap().name(), "e");
    /// ```
    pub fn root(&self) -> Option<Node> {
        self.root.map(|id| self.get(id))
    }

    /// Returns all namespace declarations, in document-wide encounter order.
    ///
    /// The list is not scoped to the declaring elements: a declaration on a
    /// deeply nested element follows one on the root.
    ///
    /// # Examples
    ///
    /// ```
    /// let doc = xmldom::Document::parse("<e xmlns:n='http://www.w3.org'/>").unwrap();
    /// assert_eq!(doc.namespaces()[0].prefix(), "n");
    /// ```
    pub fn namespaces(&self) -> &[Rc<Namespace>] {
        &self.namespaces
    }

    /// Resolves a namespace URI against the current declaration list.
    ///
    /// Returns the first declaration with a matching URI. An empty URI means
    /// "no namespace" and always resolves to `None`.
    pub fn namespace_for_uri(&self, uri: &str) -> Option<Rc<Namespace>> {
        if uri.is_empty() {
            return None;
        }

        self.namespaces.iter().find(|ns| ns.uri == uri).cloned()
    }

    /// Returns the stringified form of the latest processing instruction.
    ///
    /// The XML declaration counts as one, so for most documents this is
    /// `<?xml version="1.0"?>`-like text unless a later instruction
    /// replaced it.
    pub fn processing_instruction(&self) -> Option<&str> {
        self.proc_inst.as_deref()
    }

    /// Returns the stringified directives (`<!DOCTYPE …>` and friends),
    /// in encounter order.
    pub fn directives(&self) -> &[String] {
        &self.directives
    }

    /// Returns an iterator over the root element and all its descendants,
    /// in document order.
    pub fn descendants(&self) -> Descendants {
        Descendants { root: self.root(), next: self.root() }
    }

    fn get(&self, id: NodeId) -> Node {
        Node { id, d: &self.nodes[id.0], doc: self }
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn print_node(node: Node, depth: usize, f: &mut fmt::Formatter) -> fmt::Result {
            for _ in 0..depth {
                write!(f, "    ")?;
            }

            write!(f, "Element {{ name: {:?}", node.name())?;
            if let Some(ns) = node.namespace() {
                write!(f, ", namespace: {:?}", ns.uri())?;
            }
            if !node.attributes().is_empty() {
                write!(f, ", attributes: {:?}", node.attributes())?;
            }
            if let Some(text) = node.text() {
                write!(f, ", text: {:?}", text)?;
            }

            if node.has_children() {
                writeln!(f, ", children: [")?;
                for child in node.children() {
                    print_node(child, depth + 1, f)?;
                }
                for _ in 0..depth {
                    write!(f, "    ")?;
                }
                writeln!(f, "] }}")
            } else {
                writeln!(f, " }}")
            }
        }

        match self.root() {
            Some(root) => {
                writeln!(f, "Document [")?;
                print_node(root, 1, f)?;
                write!(f, "]")
            }
            None => write!(f, "Document []"),
        }
    }
}

/// Node ID.
///
/// Index into the `Document`-internal arena.
#[derive(Clone, Copy, PartialEq)]
struct NodeId(usize);

struct NodeData {
    parent: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
    children: Option<(NodeId, NodeId)>,
    name: String,
    ns: Option<Rc<Namespace>>,
    attributes: Vec<Attribute>,
    text: Option<String>,
}

/// A namespace declaration.
///
/// A *prefix* and URI pair. An empty prefix denotes the default namespace.
#[derive(Clone, PartialEq, Debug)]
pub struct Namespace {
    pub(crate) prefix: String,
    pub(crate) uri: String,
}

impl Namespace {
    /// Returns the namespace prefix; empty for the default namespace.
    ///
    /// # Examples
    ///
    /// ```
    /// let doc = xmldom::Document::parse("<e xmlns:n='http://www.w3.org'/>").unwrap();
    /// assert_eq!(doc.namespaces()[0].prefix(), "n");
    /// ```
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the namespace URI.
    ///
    /// # Examples
    ///
    /// ```
    /// let doc = xmldom::Document::parse("<e xmlns:n='http://www.w3.org'/>").unwrap();
    /// assert_eq!(doc.namespaces()[0].uri(), "http://www.w3.org");
    /// ```
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

/// An element attribute.
///
/// Attributes recognized as namespace declarations never appear here; they
/// are routed to [`Document::namespaces`] instead.
///
/// [`Document::namespaces`]: struct.Document.html#method.namespaces
#[derive(PartialEq)]
pub struct Attribute {
    pub(crate) ns: Option<Rc<Namespace>>,
    pub(crate) name: String,
    pub(crate) value: String,
}

impl Attribute {
    /// Returns the namespace this attribute was resolved to, if any.
    ///
    /// Unprefixed attributes never have one.
    pub fn namespace(&self) -> Option<&Namespace> {
        self.ns.as_deref()
    }

    /// Returns the attribute's local name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the attribute's value, byte-identical to the token it came from.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Attribute {{ name: {:?}, value: {:?} }}", self.name, self.value)
    }
}

/// An element node of a [`Document`].
///
/// A cheap copyable handle; all data is owned by the document.
///
/// [`Document`]: struct.Document.html
pub struct Node<'a> {
    id: NodeId,
    d: &'a NodeData,
    doc: &'a Document,
}

impl<'a> Copy for Node<'a> {}

impl<'a> Clone for Node<'a> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a> Eq for Node<'a> {}

impl<'a> PartialEq for Node<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.doc as *const _ == other.doc as *const _
    }
}

impl<'a> Node<'a> {
    /// Returns the element's local name.
    pub fn name(&self) -> &'a str {
        &self.d.name
    }

    /// Returns the namespace this element was resolved to, if any.
    ///
    /// Resolution happens when the element is created, against the
    /// declarations known at that point. The first element of the document
    /// is created before its own declarations are recorded, so it never
    /// carries a reference (see [`Document::from_tokens`]).
    ///
    /// [`Document::from_tokens`]: struct.Document.html#method.from_tokens
    pub fn namespace(&self) -> Option<&'a Namespace> {
        self.d.ns.as_deref()
    }

    /// Returns the element's attributes, in token order, without namespace
    /// declarations.
    ///
    /// # Examples
    ///
    /// ```
    /// let doc = xmldom::Document::parse("<e a='1' xmlns:n='urn:x' b='2'/>").unwrap();
    /// let root = doc.root().unwrap();
    /// assert_eq!(root.attributes().len(), 2);
    /// assert_eq!(root.attributes()[1].name(), "b");
    /// ```
    pub fn attributes(&self) -> &'a [Attribute] {
        &self.d.attributes
    }

    /// Returns the value of the attribute with the given local name.
    ///
    /// # Examples
    ///
    /// ```
    /// let doc = xmldom::Document::parse("<e a='b'/>").unwrap();
    /// assert_eq!(doc.root().unwrap().attribute("a"), Some("b"));
    /// ```
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.d.attributes.iter().find(|a| a.name == name).map(|a| a.value.as_str())
    }

    /// Checks that the element has an attribute with the given local name.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.d.attributes.iter().any(|a| a.name == name)
    }

    /// Returns the element's text content.
    ///
    /// Only the last character-data run seen while this element was the
    /// innermost open one is kept.
    pub fn text(&self) -> Option<&'a str> {
        self.d.text.as_deref()
    }

    /// Returns the document this node belongs to.
    pub fn document(&self) -> &'a Document {
        self.doc
    }

    fn gen_node(&self, id: NodeId) -> Node<'a> {
        Node { id, d: &self.doc.nodes[id.0], doc: self.doc }
    }

    /// Returns the parent element of this node.
    pub fn parent(&self) -> Option<Self> {
        self.d.parent.map(|id| self.gen_node(id))
    }

    /// Returns the previous sibling of this node.
    pub fn prev_sibling(&self) -> Option<Self> {
        self.d.prev_sibling.map(|id| self.gen_node(id))
    }

    /// Returns the next sibling of this node.
    pub fn next_sibling(&self) -> Option<Self> {
        self.d.next_sibling.map(|id| self.gen_node(id))
    }

    /// Returns the first child of this node.
    pub fn first_child(&self) -> Option<Self> {
        self.d.children.map(|(id, _)| self.gen_node(id))
    }

    /// Returns the last child of this node.
    pub fn last_child(&self) -> Option<Self> {
        self.d.children.map(|(_, id)| self.gen_node(id))
    }

    /// Returns true if this node has siblings.
    pub fn has_siblings(&self) -> bool {
        self.d.prev_sibling.is_some() || self.d.next_sibling.is_some()
    }

    /// Returns true if this node has children.
    pub fn has_children(&self) -> bool {
        self.d.children.is_some()
    }

    /// Returns an iterator over ancestor nodes.
    pub fn ancestors(&self) -> Ancestors<'a> {
        Ancestors(self.parent())
    }

    /// Returns an iterator over previous sibling nodes.
    pub fn prev_siblings(&self) -> PrevSiblings<'a> {
        PrevSiblings(self.prev_sibling())
    }

    /// Returns an iterator over next sibling nodes.
    pub fn next_siblings(&self) -> NextSiblings<'a> {
        NextSiblings(self.next_sibling())
    }

    /// Returns an iterator over children nodes, in document order.
    pub fn children(&self) -> Children<'a> {
        Children { front: self.first_child(), back: self.last_child() }
    }

    /// Returns an iterator over this node and its descendants,
    /// in document order.
    pub fn descendants(&self) -> Descendants<'a> {
        Descendants { root: Some(*self), next: Some(*self) }
    }
}

impl<'a> fmt::Debug for Node<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Element {{ name: {:?}, attributes: {:?}, text: {:?} }}",
               self.name(), self.attributes(), self.text())
    }
}

macro_rules! axis_iterators {
    ($(#[$m:meta] $i:ident($f:path);)*) => {
        $(
            #[$m]
            pub struct $i<'a>(Option<Node<'a>>);
            impl<'a> Clone for $i<'a> {
                fn clone(&self) -> Self {
                    $i(self.0)
                }
            }
            impl<'a> Iterator for $i<'a> {
                type Item = Node<'a>;
                fn next(&mut self) -> Option<Self::Item> {
                    let node = self.0.take();
                    self.0 = node.as_ref().and_then($f);
                    node
                }
            }
        )*
    };
}

axis_iterators! {
    /// Iterator over ancestors.
    Ancestors(Node::parent);

    /// Iterator over previous siblings.
    PrevSiblings(Node::prev_sibling);

    /// Iterator over next siblings.
    NextSiblings(Node::next_sibling);
}

/// Iterator over children.
pub struct Children<'a> {
    front: Option<Node<'a>>,
    back: Option<Node<'a>>,
}

impl<'a> Clone for Children<'a> {
    fn clone(&self) -> Self {
        Self { front: self.front, back: self.back }
    }
}

impl<'a> Iterator for Children<'a> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            let node = self.front.take();
            self.back = None;
            node
        } else {
            let node = self.front.take();
            self.front = node.as_ref().and_then(Node::next_sibling);
            node
        }
    }
}

impl<'a> DoubleEndedIterator for Children<'a> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.back == self.front {
            let node = self.back.take();
            self.front = None;
            node
        } else {
            let node = self.back.take();
            self.back = node.as_ref().and_then(Node::prev_sibling);
            node
        }
    }
}

/// Iterator over a subtree, in document (preorder) order.
pub struct Descendants<'a> {
    root: Option<Node<'a>>,
    next: Option<Node<'a>>,
}

impl<'a> Clone for Descendants<'a> {
    fn clone(&self) -> Self {
        Self { root: self.root, next: self.next }
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next.take()?;

        // First child, else the next sibling of the closest ancestor that
        // still is inside the subtree.
        let mut next = node.first_child();
        if next.is_none() {
            let mut current = node;
            while Some(current) != self.root {
                if let Some(sibling) = current.next_sibling() {
                    next = Some(sibling);
                    break;
                }

                match current.parent() {
                    Some(parent) => current = parent,
                    None => break,
                }
            }
        }

        self.next = next;
        Some(node)
    }
}
