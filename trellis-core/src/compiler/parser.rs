//! Template parser.
//!
//! Accepts a single root element written in a small HTML subset:
//!
//! - `<tag attr="value">children</tag>` and self-closing `<tag attr="value" />`
//! - attribute values in double quotes
//! - text runs, trimmed; whitespace-only runs are dropped
//!
//! There are no directives, expressions, comments or entities.

use super::ast::{Attr, AstNode};
use crate::error::TemplateError;

/// Parse `template` into a tree.
pub fn parse(template: &str) -> Result<AstNode, TemplateError> {
    let mut parser = Parser {
        src: template,
        pos: 0,
    };

    parser.skip_whitespace();
    if parser.at_end() {
        return Err(TemplateError::Empty);
    }
    if parser.starts_with("</") {
        return Err(TemplateError::parse(parser.pos, "unexpected closing tag"));
    }
    if !parser.starts_with("<") {
        return Err(TemplateError::parse(parser.pos, "expected a root element"));
    }

    let root = parser.element()?;

    parser.skip_whitespace();
    if !parser.at_end() {
        return Err(TemplateError::parse(
            parser.pos,
            "unexpected content after the root element",
        ));
    }
    Ok(root)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    fn bump(&mut self, len: usize) {
        self.pos += len;
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn expect(&mut self, token: &str) -> Result<(), TemplateError> {
        if self.starts_with(token) {
            self.bump(token.len());
            Ok(())
        } else {
            Err(TemplateError::parse(self.pos, format!("expected `{token}`")))
        }
    }

    /// `[A-Za-z_][A-Za-z0-9_-]*`
    fn name(&mut self, what: &str) -> Result<&'a str, TemplateError> {
        let rest = self.rest();
        match rest.chars().next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return Err(TemplateError::parse(self.pos, format!("expected {what}"))),
        }
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(rest.len());
        self.bump(len);
        Ok(&rest[..len])
    }

    fn element(&mut self) -> Result<AstNode, TemplateError> {
        let open = self.pos;
        self.expect("<")?;
        let tag = self.name("a tag name")?;

        let mut attrs = Vec::new();
        loop {
            self.skip_whitespace();
            if self.starts_with("/>") {
                self.bump(2);
                return Ok(AstNode::element(tag, attrs, Vec::new()));
            }
            if self.starts_with(">") {
                self.bump(1);
                break;
            }
            if self.at_end() {
                return Err(TemplateError::parse(open, format!("unclosed tag <{tag}>")));
            }
            attrs.push(self.attribute()?);
        }

        let children = self.children(tag, open)?;
        Ok(AstNode::element(tag, attrs, children))
    }

    fn attribute(&mut self) -> Result<Attr, TemplateError> {
        let name = self.name("an attribute name")?;
        self.skip_whitespace();
        self.expect("=")?;
        self.skip_whitespace();
        let quote = self.pos;
        self.expect("\"")?;
        let rest = self.rest();
        let Some(len) = rest.find('"') else {
            return Err(TemplateError::parse(quote, "unterminated attribute value"));
        };
        self.bump(len + 1);
        Ok(Attr::new(name, &rest[..len]))
    }

    fn children(&mut self, tag: &str, open: usize) -> Result<Vec<AstNode>, TemplateError> {
        let mut children = Vec::new();
        loop {
            if self.at_end() {
                return Err(TemplateError::parse(open, format!("unclosed tag <{tag}>")));
            }
            if self.starts_with("</") {
                let close = self.pos;
                self.bump(2);
                let name = self.name("a closing tag name")?;
                if name != tag {
                    return Err(TemplateError::parse(
                        close,
                        format!("mismatched closing tag </{name}>, expected </{tag}>"),
                    ));
                }
                self.skip_whitespace();
                self.expect(">")?;
                return Ok(children);
            }
            if self.peek() == Some('<') {
                children.push(self.element()?);
                continue;
            }

            let rest = self.rest();
            let len = rest.find('<').unwrap_or(rest.len());
            self.bump(len);
            let text = rest[..len].trim();
            if !text.is_empty() {
                children.push(AstNode::text(text));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(tag: &str, attrs: &[(&str, &str)], children: Vec<AstNode>) -> AstNode {
        AstNode::element(
            tag,
            attrs.iter().map(|(n, v)| Attr::new(*n, *v)).collect(),
            children,
        )
    }

    #[test]
    fn parses_nested_elements_and_text() {
        let ast = parse(
            r#"
            <div id="app" class="main">
                <h1>Hello</h1>
                <p>world <b>!</b></p>
            </div>
            "#,
        )
        .unwrap();

        assert_eq!(
            ast,
            el(
                "div",
                &[("id", "app"), ("class", "main")],
                vec![
                    el("h1", &[], vec![AstNode::text("Hello")]),
                    el(
                        "p",
                        &[],
                        vec![AstNode::text("world"), el("b", &[], vec![AstNode::text("!")])],
                    ),
                ],
            )
        );
    }

    #[test]
    fn parses_self_closing_tags() {
        let ast = parse(r#"<p>a<br/>b<img src="x.png" /></p>"#).unwrap();
        assert_eq!(
            ast,
            el(
                "p",
                &[],
                vec![
                    AstNode::text("a"),
                    el("br", &[], vec![]),
                    AstNode::text("b"),
                    el("img", &[("src", "x.png")], vec![]),
                ],
            )
        );
    }

    #[test]
    fn keeps_attribute_order_and_dashes() {
        let ast = parse(r#"<input data-id="1" type="text" key="k"/>"#).unwrap();
        let AstNode::Element { attrs, .. } = ast else {
            panic!("expected an element");
        };
        let names: Vec<_> = attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["data-id", "type", "key"]);
    }

    #[test]
    fn empty_template_is_an_error() {
        assert!(matches!(parse("   \n "), Err(TemplateError::Empty)));
    }

    #[test]
    fn reports_unclosed_tags() {
        let err = parse("<div><p>text</p>").unwrap_err();
        assert_eq!(err.to_string(), "parse error at byte 0: unclosed tag <div>");
    }

    #[test]
    fn reports_mismatched_closing_tags() {
        let err = parse("<div><span></div>").unwrap_err();
        assert_eq!(
            err.to_string(),
            "parse error at byte 11: mismatched closing tag </div>, expected </span>"
        );
    }

    #[test]
    fn reports_content_after_the_root() {
        assert!(matches!(parse("<a></a><b></b>"), Err(TemplateError::Parse { position: 7, .. })));
        assert!(matches!(parse("</a>"), Err(TemplateError::Parse { position: 0, .. })));
        assert!(matches!(parse("text"), Err(TemplateError::Parse { position: 0, .. })));
    }

    #[test]
    fn reports_malformed_attributes() {
        let unquoted = parse("<a href=x></a>");
        assert!(matches!(unquoted, Err(TemplateError::Parse { position: 8, .. })));
        let unterminated = parse(r#"<a href="x></a>"#);
        assert!(matches!(unterminated, Err(TemplateError::Parse { position: 8, .. })));
    }
}
