//! Visitor pattern for AST traversal.
//!
//! Extractors that need more than a regex implement [`AstVisitor`] and are
//! driven over a parsed module by [`walk_ast`].

mod context;
mod traits;

pub use context::VisitorContext;
pub use traits::AstVisitor;

use std::ops::ControlFlow;

use swc_ecma_ast::Module;
use swc_ecma_visit::{Visit, VisitWith};

struct Walker<'a, V: AstVisitor> {
    visitor: &'a mut V,
    ctx: &'a VisitorContext<'a>,
    stopped: bool,
}

impl<V: AstVisitor> Visit for Walker<'_, V> {
    fn visit_call_expr(&mut self, node: &swc_ecma_ast::CallExpr) {
        if self.stopped {
            return;
        }
        if let ControlFlow::Break(()) = self.visitor.visit_call_expr(node, self.ctx) {
            self.stopped = true;
            return;
        }
        node.visit_children_with(self);
    }

    fn visit_jsx_element(&mut self, node: &swc_ecma_ast::JSXElement) {
        if self.stopped {
            return;
        }
        if let ControlFlow::Break(()) = self.visitor.visit_jsx_element(node, self.ctx) {
            self.stopped = true;
            return;
        }
        node.visit_children_with(self);
    }
}

pub fn walk_ast<V: AstVisitor>(module: &Module, visitor: &mut V, ctx: &VisitorContext) {
    let mut walker = Walker {
        visitor,
        ctx,
        stopped: false,
    };
    module.visit_with(&mut walker);
}

#[cfg(test)]
mod tests {
    use std::ops::ControlFlow;

    use swc_ecma_ast::{CallExpr, JSXElement};

    use super::*;
    use crate::parser::ParsedFile;

    #[derive(Default)]
    struct Counter {
        calls: usize,
        elements: usize,
        stop_after_first_call: bool,
    }

    impl AstVisitor for Counter {
        fn visit_call_expr(&mut self, _node: &CallExpr, _ctx: &VisitorContext) -> ControlFlow<()> {
            self.calls += 1;
            if self.stop_after_first_call {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }

        fn visit_jsx_element(
            &mut self,
            _node: &JSXElement,
            _ctx: &VisitorContext,
        ) -> ControlFlow<()> {
            self.elements += 1;
            ControlFlow::Continue(())
        }
    }

    fn walk(code: &str, filename: &str, counter: &mut Counter) {
        let parsed = ParsedFile::from_source(filename, code);
        let ctx = VisitorContext::new(&parsed);
        walk_ast(parsed.module().expect("module"), counter, &ctx);
    }

    #[test]
    fn visits_nested_calls() {
        let mut counter = Counter::default();
        walk("fetch(url(a(), b()));", "test.js", &mut counter);

        assert_eq!(counter.calls, 4);
    }

    #[test]
    fn visits_nested_jsx_elements() {
        let mut counter = Counter::default();
        walk(
            "export default function P() { return <div><button>Go</button><a href=\"/x\">x</a></div>; }",
            "page.tsx",
            &mut counter,
        );

        assert_eq!(counter.elements, 3);
    }

    #[test]
    fn break_stops_traversal() {
        let mut counter = Counter {
            stop_after_first_call: true,
            ..Default::default()
        };
        walk("a(); b(); c();", "test.js", &mut counter);

        assert_eq!(counter.calls, 1);
    }
}
