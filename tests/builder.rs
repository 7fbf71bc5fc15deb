//! Tests driving the builder with hand-written token streams, independent
//! of any tokenizer.

use pretty_assertions::assert_eq;

use xmldom::*;

fn start(local: &str, uri: &str, attributes: Vec<TokenAttribute>) -> Token {
    Token::ElementStart { name: QName::new(uri, local), attributes }
}

fn attr(local: &str, uri: &str, value: &str) -> TokenAttribute {
    TokenAttribute { name: QName::new(uri, local), value: value.to_string() }
}

fn build(tokens: Vec<Token>) -> Result<Document, Error> {
    Document::from_tokens(tokens.into_iter())
}

#[test]
fn empty_stream_has_no_root() {
    let doc = build(vec![]).unwrap();
    assert!(doc.root().is_none());
    assert!(doc.namespaces().is_empty());
    assert!(doc.directives().is_empty());
    assert_eq!(doc.processing_instruction(), None);
}

#[test]
fn root_is_set_exactly_once() {
    let doc = build(vec![
        start("a", "", vec![]),
        start("b", "", vec![]),
        Token::ElementEnd,
        Token::ElementEnd,
    ])
    .unwrap();

    assert_eq!(doc.root().unwrap().name(), "a");
}

#[test]
fn children_follow_start_token_order() {
    let doc = build(vec![
        start("r", "", vec![]),
        start("a", "", vec![]),
        Token::ElementEnd,
        start("b", "", vec![]),
        Token::ElementEnd,
        start("c", "", vec![]),
        Token::ElementEnd,
        Token::ElementEnd,
    ])
    .unwrap();

    let names: Vec<&str> = doc.root().unwrap().children().map(|n| n.name()).collect();
    assert_eq!(names, ["a", "b", "c"]);
}

#[test]
fn later_text_overwrites_earlier_text() {
    let doc = build(vec![
        start("a", "", vec![]),
        Token::Text("A".to_string()),
        Token::Text("B".to_string()),
        Token::ElementEnd,
    ])
    .unwrap();

    assert_eq!(doc.root().unwrap().text(), Some("B"));
}

#[test]
fn text_outside_any_element_is_discarded() {
    let doc = build(vec![
        Token::Text("before".to_string()),
        start("a", "", vec![]),
        Token::ElementEnd,
        Token::Text("after".to_string()),
    ])
    .unwrap();

    assert_eq!(doc.root().unwrap().text(), None);
}

#[test]
fn close_without_open_element_fails() {
    let err = build(vec![Token::ElementEnd]).unwrap_err();
    assert!(matches!(err, Error::UnexpectedCloseTag));

    let err = build(vec![
        start("a", "", vec![]),
        Token::ElementEnd,
        Token::ElementEnd,
    ])
    .unwrap_err();
    assert!(matches!(err, Error::UnexpectedCloseTag));
}

#[test]
fn unterminated_elements_are_accepted() {
    let doc = build(vec![
        start("a", "", vec![]),
        start("b", "", vec![]),
        Token::Text("hi".to_string()),
    ])
    .unwrap();

    let root = doc.root().unwrap();
    assert_eq!(root.name(), "a");
    assert_eq!(root.first_child().unwrap().text(), Some("hi"));
}

#[test]
fn first_element_never_resolves_its_namespace() {
    // The root element carries a matching declaration and a matching URI,
    // but resolution runs before its attributes are scanned.
    let doc = build(vec![
        start("a", "urn:x", vec![attr("xmlns", "", "urn:x")]),
        start("b", "urn:x", vec![]),
        Token::ElementEnd,
        Token::ElementEnd,
    ])
    .unwrap();

    let root = doc.root().unwrap();
    assert_eq!(root.namespace(), None);

    let b = root.first_child().unwrap();
    assert_eq!(b.namespace().unwrap().uri(), "urn:x");
}

#[test]
fn xmlns_attributes_become_declarations() {
    let doc = build(vec![
        start("a", "", vec![
            attr("x", "", "1"),
            attr("xmlns", "", "urn:default"),
            attr("p", "xmlns", "urn:prefixed"),
            attr("y", "", "2"),
        ]),
        Token::ElementEnd,
    ])
    .unwrap();

    let root = doc.root().unwrap();
    let names: Vec<&str> = root.attributes().iter().map(|a| a.name()).collect();
    assert_eq!(names, ["x", "y"]);

    let decls: Vec<(&str, &str)> = doc
        .namespaces()
        .iter()
        .map(|ns| (ns.prefix(), ns.uri()))
        .collect();
    assert_eq!(decls, [("", "urn:default"), ("p", "urn:prefixed")]);
}

#[test]
fn declaration_order_is_global() {
    let doc = build(vec![
        start("a", "", vec![attr("one", "xmlns", "urn:1")]),
        start("b", "", vec![attr("two", "xmlns", "urn:2")]),
        start("c", "", vec![attr("three", "xmlns", "urn:3")]),
        Token::ElementEnd,
        Token::ElementEnd,
        Token::ElementEnd,
    ])
    .unwrap();

    let prefixes: Vec<&str> = doc.namespaces().iter().map(|ns| ns.prefix()).collect();
    assert_eq!(prefixes, ["one", "two", "three"]);
}

#[test]
fn attribute_resolution_sees_earlier_attributes_of_same_element() {
    // Declarations are recorded while scanning the attribute list, so an
    // attribute resolves only against declarations textually before it.
    let doc = build(vec![
        start("a", "", vec![]),
        start("b", "", vec![
            attr("early", "urn:u", "1"),
            attr("p", "xmlns", "urn:u"),
            attr("late", "urn:u", "2"),
        ]),
        Token::ElementEnd,
        Token::ElementEnd,
    ])
    .unwrap();

    let b = doc.root().unwrap().first_child().unwrap();
    assert_eq!(b.attributes()[0].name(), "early");
    assert_eq!(b.attributes()[0].namespace(), None);
    assert_eq!(b.attributes()[1].name(), "late");
    assert_eq!(b.attributes()[1].namespace().unwrap().uri(), "urn:u");
}

#[test]
fn namespace_reference_is_first_declared_for_uri() {
    let doc = build(vec![
        start("a", "", vec![
            attr("p", "xmlns", "urn:u"),
            attr("q", "xmlns", "urn:u"),
        ]),
        start("b", "urn:u", vec![]),
        Token::ElementEnd,
        Token::ElementEnd,
    ])
    .unwrap();

    let b = doc.root().unwrap().first_child().unwrap();
    assert_eq!(b.namespace().unwrap().prefix(), "p");
}

#[test]
fn processing_instruction_overwrites() {
    let doc = build(vec![
        Token::ProcessingInstruction {
            target: "one".to_string(),
            content: Some("a".to_string()),
        },
        start("r", "", vec![]),
        Token::ElementEnd,
        Token::ProcessingInstruction { target: "two".to_string(), content: None },
    ])
    .unwrap();

    assert_eq!(doc.processing_instruction(), Some("<?two?>"));
}

#[test]
fn directives_append_in_order() {
    let doc = build(vec![
        Token::Directive("DOCTYPE a".to_string()),
        Token::Directive("ENTITY b 'c'".to_string()),
        start("r", "", vec![]),
        Token::ElementEnd,
    ])
    .unwrap();

    assert_eq!(doc.directives(), ["<!DOCTYPE a>", "<!ENTITY b 'c'>"]);
}

#[test]
fn text_is_per_open_element() {
    let doc = build(vec![
        start("a", "", vec![]),
        Token::Text("outer".to_string()),
        start("b", "", vec![]),
        Token::Text("inner".to_string()),
        Token::ElementEnd,
        Token::Text("tail".to_string()),
        Token::ElementEnd,
    ])
    .unwrap();

    let root = doc.root().unwrap();
    // The tail run replaces the earlier text of <a>; <b> keeps its own.
    assert_eq!(root.text(), Some("tail"));
    assert_eq!(root.first_child().unwrap().text(), Some("inner"));
}

#[test]
fn deep_nesting_pops_to_exact_parent() {
    let doc = build(vec![
        start("a", "", vec![]),
        start("b", "", vec![]),
        start("c", "", vec![]),
        Token::ElementEnd,
        start("d", "", vec![]),
        Token::ElementEnd,
        Token::ElementEnd,
        start("e", "", vec![]),
        Token::ElementEnd,
        Token::ElementEnd,
    ])
    .unwrap();

    let names: Vec<&str> = doc.descendants().map(|n| n.name()).collect();
    assert_eq!(names, ["a", "b", "c", "d", "e"]);

    let e = doc.root().unwrap().last_child().unwrap();
    assert_eq!(e.name(), "e");
    assert_eq!(e.parent().unwrap().name(), "a");
}

#[test]
fn values_are_kept_verbatim() {
    let doc = build(vec![
        start("a", "", vec![attr("x", "", "  raw &amp; untouched\t")]),
        Token::ElementEnd,
    ])
    .unwrap();

    // The builder never rewrites token payloads; whatever the source
    // produced is stored byte for byte.
    assert_eq!(doc.root().unwrap().attribute("x"), Some("  raw &amp; untouched\t"));
}
