//! Tree-walking evaluator: renders a named template by resolving
//! inheritance and walking its block list.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::rc::Rc;

use indexmap::IndexMap;
use log::trace;

use crate::ast::{Branch, Expression, Loop, NamedBlock, Tag, Template};
use crate::error::TemplateError;
use crate::token::Position;
use crate::value::Value;

pub struct Evaluator<'a> {
    templates: &'a HashMap<String, Template>,
    variables: HashMap<String, Value>,
    /// Inheritance chain for the template currently being rendered, ordered
    /// most-derived first, base (the template actually walked) last. Named
    /// blocks resolve by scanning this chain top-down (kept here as
    /// transient per-render state rather than mutating the templates
    /// themselves, so a template stays safe to render again or
    /// concurrently from another environment).
    chain: Vec<&'a Template>,
    current_template_name: String,
    break_flag: bool,
    aborted: bool,
    errors: Vec<TemplateError>,
}

impl<'a> Evaluator<'a> {
    pub fn new(templates: &'a HashMap<String, Template>, variables: HashMap<String, Value>) -> Self {
        Self {
            templates,
            variables,
            chain: Vec::new(),
            current_template_name: String::new(),
            break_flag: false,
            aborted: false,
            errors: Vec::new(),
        }
    }

    pub fn into_errors(self) -> Vec<TemplateError> {
        self.errors
    }

    /// Render `name`, resolving any `extends` chain first. Returns `None`
    /// only when `name` (or an ancestor it extends) doesn't exist; every
    /// other failure still returns the partial output accumulated so far.
    pub fn render(&mut self, name: &str) -> Option<String> {
        self.chain = self.build_chain(name, (0, 0))?;
        self.current_template_name = self.chain.last().expect("chain always has at least one entry").name.clone();
        self.break_flag = false;
        self.aborted = false;

        let mut out = String::new();
        let base = *self.chain.last().expect("chain always has at least one entry");
        self.render_blocks(&base.blocks, &mut out);
        Some(out)
    }

    fn build_chain(&mut self, name: &str, position: Position) -> Option<Vec<&'a Template>> {
        let mut chain = Vec::new();
        let mut current = name.to_string();
        loop {
            let Some(template) = self.templates.get(&current) else {
                self.errors.push(TemplateError::eval(
                    name.to_string(),
                    position,
                    format!("undefined template '{current}'"),
                ));
                return None;
            };
            chain.push(template);
            match template.extends() {
                Some(parent) => {
                    trace!("template '{current}' extends '{parent}', walking up the chain");
                    current = parent.to_string();
                }
                None => return Some(chain),
            }
        }
    }

    fn eval_error(&mut self, position: Position, message: impl Into<String>) {
        self.errors.push(TemplateError::eval(
            self.current_template_name.clone(),
            position,
            message,
        ));
        self.aborted = true;
    }

    fn resolve_named_block(&self, node: &Rc<NamedBlock>) -> (Rc<NamedBlock>, String) {
        trace!(
            "resolving named block '{}' across a chain of {} template(s)",
            node.name,
            self.chain.len()
        );
        for template in &self.chain {
            if let Some(found) = template.named_block_index.get(&node.name) {
                trace!("named block '{}' overridden by '{}'", node.name, template.name);
                return (Rc::clone(found), template.name.clone());
            }
        }
        (Rc::clone(node), self.current_template_name.clone())
    }

    fn render_blocks(&mut self, blocks: &[crate::ast::Block], out: &mut String) {
        use crate::ast::Block;
        for block in blocks {
            if self.aborted || self.break_flag {
                return;
            }
            match block {
                Block::Content { text, .. } => out.push_str(text),
                Block::Variable { expr, .. } => match self.eval_expr(expr) {
                    Some(value) => {
                        let _ = write!(out, "{value}");
                    }
                    None => return,
                },
                Block::Tag(tag) => self.render_tag(tag, out),
            }
        }
    }

    fn render_tag(&mut self, tag: &Tag, out: &mut String) {
        match tag {
            Tag::If(branch) => self.render_branch_chain(branch, out),
            Tag::For(loop_) => self.render_for(loop_, out),
            Tag::Block(node) => {
                let (resolved, owner_name) = self.resolve_named_block(node);
                let previous = std::mem::replace(&mut self.current_template_name, owner_name);
                self.render_blocks(&resolved.subblocks, out);
                self.current_template_name = previous;
            }
            // Only meaningful as the template's first block; consumed by
            // `render`'s chain-building, inert anywhere else.
            Tag::Extends { .. } => {}
            Tag::Break { .. } => self.break_flag = true,
        }
    }

    fn render_branch_chain(&mut self, branch: &Branch, out: &mut String) {
        let mut current = Some(branch);
        while let Some(b) = current {
            if self.aborted {
                return;
            }
            match &b.condition {
                Some(cond) => {
                    let Some(value) = self.eval_expr(cond) else {
                        return;
                    };
                    if value.truthy() {
                        self.render_blocks(&b.subblocks, out);
                        return;
                    }
                    current = b.next.as_deref();
                }
                None => {
                    self.render_blocks(&b.subblocks, out);
                    return;
                }
            }
        }
    }

    fn render_for(&mut self, loop_: &Loop, out: &mut String) {
        let Some(sequence) = self.eval_expr(&loop_.sequence) else {
            return;
        };
        let items: Vec<Value> = match sequence {
            Value::Sequence(items) => items.borrow().clone(),
            Value::Mapping(entries) => entries.borrow().values().cloned().collect(),
            other => {
                self.eval_error(
                    loop_.sequence.position(),
                    format!(
                        "for-loop sequence must be a sequence or mapping, got {}",
                        other.kind_name()
                    ),
                );
                return;
            }
        };

        let saved_item = self.variables.remove(&loop_.item);
        let saved_loop = self.variables.remove("loop");

        for (index, value) in items.into_iter().enumerate() {
            if self.aborted || self.break_flag {
                break;
            }
            self.variables.insert(loop_.item.clone(), value);
            let mut loop_fields = IndexMap::new();
            loop_fields.insert(Rc::from("index"), Value::Int(index as i64));
            self.variables
                .insert("loop".to_string(), Value::mapping(loop_fields));
            self.render_blocks(&loop_.subblocks, out);
        }

        self.variables.remove(&loop_.item);
        self.variables.remove("loop");
        if let Some(value) = saved_item {
            self.variables.insert(loop_.item.clone(), value);
        }
        if let Some(value) = saved_loop {
            self.variables.insert("loop".to_string(), value);
        }
        // Consumed: a break only ever terminates the nearest enclosing loop.
        self.break_flag = false;
    }

    fn eval_expr(&mut self, expr: &Expression) -> Option<Value> {
        match expr {
            Expression::Ident { name, .. } => {
                Some(self.variables.get(name).cloned().unwrap_or(Value::Null))
            }
            Expression::Integer { value, .. } => Some(Value::Int(*value)),
            Expression::Boolean { value, .. } => Some(Value::Bool(*value)),
            Expression::Str { value, .. } => Some(Value::str(value.clone())),
            Expression::Prefix { op, right } => {
                let rhs = self.eval_expr(right)?;
                match op.literal.as_str() {
                    "!" | "not" => Some(Value::Bool(!rhs.truthy())),
                    "-" => match rhs.as_int() {
                        Some(i) => Some(Value::Int(-i)),
                        None => {
                            self.eval_error(
                                op.position,
                                format!("unary '-' requires an int, got {}", rhs.kind_name()),
                            );
                            None
                        }
                    },
                    other => {
                        self.eval_error(op.position, format!("unknown prefix operator '{other}'"));
                        None
                    }
                }
            }
            Expression::Infix { op, left, right } => self.eval_infix(op, left, right),
            Expression::Member { left, key, position } => {
                let base = self.eval_expr(left)?;
                match base {
                    Value::Mapping(entries) => {
                        Some(entries.borrow().get(key.as_str()).cloned().unwrap_or(Value::Null))
                    }
                    other => {
                        self.eval_error(
                            *position,
                            format!("member access requires a mapping, got {}", other.kind_name()),
                        );
                        None
                    }
                }
            }
            Expression::Index { left, key, position } => {
                let base = self.eval_expr(left)?;
                let key = self.eval_expr(key)?;
                match base {
                    Value::Sequence(items) => {
                        let Some(index) = key.as_int() else {
                            self.eval_error(
                                *position,
                                format!("index must be an int, got {}", key.kind_name()),
                            );
                            return None;
                        };
                        let items = items.borrow();
                        let value = usize::try_from(index)
                            .ok()
                            .and_then(|i| items.get(i))
                            .cloned()
                            .unwrap_or(Value::Null);
                        Some(value)
                    }
                    other => {
                        self.eval_error(
                            *position,
                            format!("indexing requires a sequence, got {}", other.kind_name()),
                        );
                        None
                    }
                }
            }
        }
    }

    fn eval_infix(
        &mut self,
        op: &crate::ast::Operator,
        left: &Expression,
        right: &Expression,
    ) -> Option<Value> {
        match op.literal.as_str() {
            "and" => {
                let lhs = self.eval_expr(left)?;
                if !lhs.truthy() {
                    return Some(Value::Bool(false));
                }
                let rhs = self.eval_expr(right)?;
                Some(Value::Bool(rhs.truthy()))
            }
            "or" => {
                let lhs = self.eval_expr(left)?;
                if lhs.truthy() {
                    return Some(Value::Bool(true));
                }
                let rhs = self.eval_expr(right)?;
                Some(Value::Bool(rhs.truthy()))
            }
            "+" | "-" | "*" | "/" => {
                let lhs = self.eval_expr(left)?;
                let rhs = self.eval_expr(right)?;
                let (Some(a), Some(b)) = (lhs.as_int(), rhs.as_int()) else {
                    self.eval_error(
                        op.position,
                        format!(
                            "arithmetic '{}' requires int operands, got {} and {}",
                            op.literal,
                            lhs.kind_name(),
                            rhs.kind_name()
                        ),
                    );
                    return None;
                };
                match op.literal.as_str() {
                    "+" => Some(Value::Int(a.wrapping_add(b))),
                    "-" => Some(Value::Int(a.wrapping_sub(b))),
                    "*" => Some(Value::Int(a.wrapping_mul(b))),
                    "/" => {
                        if b == 0 {
                            self.eval_error(op.position, "division by zero");
                            None
                        } else {
                            Some(Value::Int(a / b))
                        }
                    }
                    _ => unreachable!(),
                }
            }
            "<" | ">" | "<=" | ">=" | "==" | "!=" => {
                let lhs = self.eval_expr(left)?;
                let rhs = self.eval_expr(right)?;
                Value::compare(&op.literal, &lhs, &rhs).map(Value::Bool)
            }
            other => {
                self.eval_error(op.position, format!("unknown infix operator '{other}'"));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn render(templates: &[(&str, &str)], vars: HashMap<String, Value>, entry: &str) -> (Option<String>, Vec<TemplateError>) {
        let mut map = HashMap::new();
        for (name, source) in templates {
            let (template, errors) = parser::parse(name, source);
            assert!(errors.is_empty(), "{name}: {errors:?}");
            map.insert(name.to_string(), template);
        }
        let mut evaluator = Evaluator::new(&map, vars);
        let out = evaluator.render(entry);
        (out, evaluator.into_errors())
    }

    fn mapping_vars(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn arithmetic_scenario() {
        let mut foo = IndexMap::new();
        foo.insert(Rc::from("bar"), Value::Int(8));
        foo.insert(Rc::from("baz"), Value::Int(4));
        let vars = mapping_vars(&[("foo", Value::mapping(foo))]);
        let (out, errors) = render(
            &[(
                "t",
                "{{ foo.bar }}{{ foo.bar + foo.baz }}{{ foo.bar - foo.baz }}{{ foo.bar * foo.baz }}{{ foo.bar / foo.baz }}",
            )],
            vars,
            "t",
        );
        assert!(errors.is_empty());
        assert_eq!(out.unwrap(), "8124322");
    }

    #[test]
    fn conditional_scenario() {
        let template = "{% if foo > bar %}Yes{% elif baz %}Maybe{% else %}No{% endif %}";
        let vars = mapping_vars(&[("foo", Value::Int(10)), ("bar", Value::Int(20))]);
        let (out, _) = render(&[("t", template)], vars, "t");
        assert_eq!(out.unwrap(), "No");

        let vars = mapping_vars(&[
            ("foo", Value::Int(10)),
            ("bar", Value::Int(20)),
            ("baz", Value::Int(69)),
        ]);
        let (out, _) = render(&[("t", template)], vars, "t");
        assert_eq!(out.unwrap(), "Maybe");

        let vars = mapping_vars(&[
            ("foo", Value::Int(420)),
            ("bar", Value::Int(20)),
            ("baz", Value::Int(69)),
        ]);
        let (out, _) = render(&[("t", template)], vars, "t");
        assert_eq!(out.unwrap(), "Yes");
    }

    #[test]
    fn loop_with_index_scenario() {
        let vars = mapping_vars(&[(
            "foo",
            Value::sequence(vec![Value::str("hello"), Value::str("world")]),
        )]);
        let (out, errors) = render(
            &[("t", "{% for v in foo %}{{ loop.index }}{{ v }}{% endfor %}")],
            vars,
            "t",
        );
        assert!(errors.is_empty());
        assert_eq!(out.unwrap(), "0hello1world");
    }

    #[test]
    fn inheritance_scenario() {
        let parent = "hello{% block title %}{% endblock %}{% block content %}Content{% endblock %}{% block foot %}Foot{% endblock %}";
        let child = "{% extends \"parent\" %}{% block title %}, world{% endblock %}{% block content %}In a beautiful place out in the country.{% endblock %}";
        let (out, errors) = render(&[("parent", parent), ("child", child)], HashMap::new(), "child");
        assert!(errors.is_empty());
        assert_eq!(
            out.unwrap(),
            "hello, worldIn a beautiful place out in the country.Foot"
        );
    }

    #[test]
    fn break_scenario() {
        let vars = mapping_vars(&[(
            "xs",
            Value::sequence(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
        )]);
        let (out, errors) = render(
            &[("t", "{% for v in xs %}{{ v }}{% break %}{% endfor %}")],
            vars,
            "t",
        );
        assert!(errors.is_empty());
        assert_eq!(out.unwrap(), "1");
    }

    #[test]
    fn undefined_identifier_is_null() {
        let (out, errors) = render(&[("t", "{{ nope }}")], HashMap::new(), "t");
        assert!(errors.is_empty());
        assert_eq!(out.unwrap(), "null");
    }

    #[test]
    fn division_by_zero_aborts_render() {
        let (out, errors) = render(&[("t", "before{{ 1 / 0 }}after")], HashMap::new(), "t");
        assert_eq!(out.unwrap(), "before");
        assert!(errors.iter().any(|e| e.to_string().contains("division by zero")));
    }

    #[test]
    fn undefined_template_reports_error() {
        let (out, errors) = render(&[], HashMap::new(), "missing");
        assert!(out.is_none());
        assert!(errors.iter().any(|e| e.to_string().contains("undefined template")));
    }
}
