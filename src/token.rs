//! The token contract between a lexical tokenizer and the tree builder.
//!
//! The builder does not care where tokens come from: [`TokenStream`] produces
//! them from raw XML text, and any `Iterator<Item = Token>` works as an
//! infallible source, which is handy for tests and for embedders with their
//! own lexer.
//!
//! [`TokenStream`]: ../struct.TokenStream.html

use crate::parse::Error;

/// A qualified name: a local part plus a pre-resolved namespace URI.
///
/// An empty URI means "no namespace". For attributes, the literal URI
/// `xmlns` marks a prefixed namespace declaration (`xmlns:p="…"`), while a
/// default declaration (`xmlns="…"`) has an empty URI and the local name
/// `xmlns`. This mirrors how the tokenizer reports declarations before the
/// builder has interpreted them.
#[derive(Clone, PartialEq, Debug)]
pub struct QName {
    /// The resolved namespace URI; empty if the name has none.
    pub uri: String,
    /// The local (unqualified) name.
    pub local: String,
}

impl QName {
    /// Creates a qualified name.
    pub fn new<U: Into<String>, L: Into<String>>(uri: U, local: L) -> QName {
        QName { uri: uri.into(), local: local.into() }
    }

    /// Creates a name without a namespace.
    pub fn local<L: Into<String>>(local: L) -> QName {
        QName { uri: String::new(), local: local.into() }
    }
}

/// A raw attribute as carried by a start-element token.
///
/// Namespace declarations are still present at this stage; the builder is
/// the one that strips them out and records them on the document.
#[derive(Clone, PartialEq, Debug)]
pub struct TokenAttribute {
    /// The attribute's qualified name.
    pub name: QName,
    /// The attribute's value.
    pub value: String,
}

/// One lexical token of an XML document.
#[derive(Clone, PartialEq, Debug)]
pub enum Token {
    /// A start tag, with its raw attributes in source order.
    ElementStart {
        /// The element's qualified name.
        name: QName,
        /// The raw attributes, namespace declarations included.
        attributes: Vec<TokenAttribute>,
    },
    /// An end tag. The builder tracks which element it closes.
    ElementEnd,
    /// A run of character data.
    Text(String),
    /// A processing instruction, `<?target content?>`.
    ProcessingInstruction {
        /// The instruction target.
        target: String,
        /// The instruction content, if any.
        content: Option<String>,
    },
    /// A directive such as `DOCTYPE …` (without the `<!` and `>`).
    Directive(String),
}

/// A finite, single-pass producer of tokens.
///
/// `next_token` returns `Ok(None)` at clean end-of-input; any read failure
/// is reported as [`Error::Source`] and terminates the build.
///
/// [`Error::Source`]: enum.Error.html#variant.Source
pub trait TokenSource {
    /// Pulls the next token.
    fn next_token(&mut self) -> Result<Option<Token>, Error>;
}

impl<I: Iterator<Item = Token>> TokenSource for I {
    fn next_token(&mut self) -> Result<Option<Token>, Error> {
        Ok(self.next())
    }
}
