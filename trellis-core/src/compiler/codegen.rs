//! Code generation.
//!
//! A template tree is turned into a [`Render`] function: a closure tree that
//! calls the element and text constructors ([`h`] and [`text`]) on every
//! render. [`source`] prints the same composition as readable code, which
//! is handy in logs and test failures.

use std::fmt;
use std::rc::Rc;

use super::ast::AstNode;
use super::parser::parse;
use crate::error::TemplateError;
use crate::reactive::ReactiveObject;
use crate::vnode::{h, text, Attrs, VNode};

type NodeFn = Box<dyn Fn(&ReactiveObject) -> VNode>;

/// A render function: builds the root vnode from the instance state.
///
/// Cloning shares the function.
#[derive(Clone)]
pub struct Render(Rc<dyn Fn(&ReactiveObject) -> VNode>);

impl Render {
    /// Wrap a hand-written render function.
    pub fn new(render: impl Fn(&ReactiveObject) -> VNode + 'static) -> Self {
        Self(Rc::new(render))
    }

    pub fn call(&self, state: &ReactiveObject) -> VNode {
        (self.0)(state)
    }
}

impl fmt::Debug for Render {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Render(..)")
    }
}

/// Output of [`compile`].
#[derive(Debug, Clone)]
pub struct Compiled {
    pub render: Render,
    pub ast: AstNode,
}

/// Parse `template` and generate its render function.
pub fn compile(template: &str) -> Result<Compiled, TemplateError> {
    let ast = parse(template)?;
    let render = generate(&ast);
    Ok(Compiled { render, ast })
}

/// Generate the render function for `ast`.
pub fn generate(ast: &AstNode) -> Render {
    Render(Rc::from(gen_node(ast)))
}

fn gen_node(ast: &AstNode) -> NodeFn {
    match ast {
        AstNode::Element {
            tag,
            attrs,
            children,
        } => {
            let tag = tag.clone();
            let attrs: Attrs = attrs
                .iter()
                .map(|attr| (attr.name.clone(), attr.value.clone()))
                .collect();
            let children: Vec<NodeFn> = children.iter().map(gen_node).collect();
            Box::new(move |state: &ReactiveObject| {
                h(
                    tag.as_str(),
                    attrs.clone(),
                    children.iter().map(|child| child(state)).collect(),
                )
            })
        }
        AstNode::Text(content) => {
            let content = content.clone();
            Box::new(move |_: &ReactiveObject| text(content.as_str()))
        }
    }
}

/// Print the constructor calls a render of `ast` performs, in the
/// `_c(tag, {attrs}, children...)` / `_v(text)` notation.
pub fn source(ast: &AstNode) -> String {
    let mut out = String::new();
    write_source(ast, &mut out);
    out
}

fn write_source(ast: &AstNode, out: &mut String) {
    match ast {
        AstNode::Element {
            tag,
            attrs,
            children,
        } => {
            out.push_str("_c(");
            out.push_str(&quote(tag));
            if !attrs.is_empty() {
                out.push_str(",{");
                for (i, attr) in attrs.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    out.push_str(&quote(&attr.name));
                    out.push(':');
                    out.push_str(&quote(&attr.value));
                }
                out.push('}');
            }
            for child in children {
                out.push(',');
                write_source(child, out);
            }
            out.push(')');
        }
        AstNode::Text(content) => {
            out.push_str("_v(");
            out.push_str(&quote(content));
            out.push(')');
        }
    }
}

fn quote(raw: &str) -> String {
    serde_json::Value::from(raw).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;
    use crate::vnode::patch;

    #[test]
    fn generated_render_builds_the_template_tree() {
        let compiled =
            compile(r#"<ul class="list"><li key="a">A</li><li key="b">B</li></ul>"#).unwrap();
        let vnode = compiled.render.call(&ReactiveObject::new());

        assert_eq!(vnode.tag(), Some("ul"));
        let keys: Vec<_> = vnode.child_nodes().iter().map(|c| c.key_value()).collect();
        assert_eq!(keys, [Some("a"), Some("b")]);

        let mut dom = MemoryDom::new();
        let root = dom.create_container("div");
        patch(&mut dom, None, &vnode, root).unwrap();
        assert_eq!(
            dom.inner_html(root),
            "<ul class=\"list\"><li>A</li><li>B</li></ul>"
        );
    }

    #[test]
    fn each_render_returns_fresh_vnodes() {
        let compiled = compile("<p>x</p>").unwrap();
        let state = ReactiveObject::new();
        let first = compiled.render.call(&state);
        let second = compiled.render.call(&state);
        assert!(first.is_same(&second));
        assert_eq!(second.el(), None);
    }

    #[test]
    fn source_prints_constructor_calls() {
        let compiled = compile(r#"<div id="app"><p>say "hi"</p><br/></div>"#).unwrap();
        assert_eq!(
            source(&compiled.ast),
            r#"_c("div",{"id":"app"},_c("p",_v("say \"hi\"")),_c("br"))"#
        );
    }

    #[test]
    fn compile_surfaces_parse_errors() {
        assert!(matches!(compile(""), Err(TemplateError::Empty)));
    }
}
