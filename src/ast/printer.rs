//! Render statements as declarative build source text.

use crate::ast::node::{Arguments, CodeBlock, Statement, Value};

const DEFAULT_INDENT: usize = 2;
const DEFAULT_ARG_CUTOFF: usize = 5;

/// Pretty printer for a [`CodeBlock`].
///
/// Argument lists are broken one entry per line when they hold more than
/// `arg_newline_cutoff` entries or any array or call.
#[derive(Debug, Clone)]
pub struct Printer {
    indent: usize,
    arg_newline_cutoff: usize,
    level: usize,
    is_newline: bool,
    result: String,
}

impl Default for Printer {
    fn default() -> Self {
        Printer::new(DEFAULT_INDENT, DEFAULT_ARG_CUTOFF)
    }
}

impl Printer {
    pub fn new(indent: usize, arg_newline_cutoff: usize) -> Self {
        Printer {
            indent,
            arg_newline_cutoff,
            level: 0,
            is_newline: true,
            result: String::new(),
        }
    }

    /// Render `block`, one statement per line.
    pub fn print(mut self, block: &CodeBlock) -> String {
        for statement in &block.lines {
            self.statement(statement);
            self.newline();
        }
        self.result
    }

    fn append(&mut self, data: &str) {
        if self.is_newline {
            self.result.push_str(&" ".repeat(self.level));
        }
        self.result.push_str(data);
        self.is_newline = false;
    }

    fn newline(&mut self) {
        self.result.push('\n');
        self.is_newline = true;
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Expression(value) => self.value(value),
            Statement::Assignment { name, value } => {
                self.append(name);
                self.append(" = ");
                self.value(value);
            }
        }
    }

    fn value(&mut self, value: &Value) {
        match value {
            Value::String(s) => self.append(&quote(s)),
            Value::Bool(b) => self.append(if *b { "true" } else { "false" }),
            Value::Id(id) => self.append(id),
            Value::Array(items) => {
                self.append("[");
                self.indented(|p| p.list(items.iter().map(|v| (None, v))));
                self.append("]");
            }
            Value::Call(call) => {
                self.append(&call.name);
                self.append("(");
                self.indented(|p| p.arguments(&call.args));
                self.append(")");
            }
            Value::Method(call) => {
                self.value(&call.object);
                self.append(".");
                self.append(&call.name);
                self.append("(");
                self.indented(|p| p.arguments(&call.args));
                self.append(")");
            }
        }
    }

    fn indented(&mut self, f: impl FnOnce(&mut Self)) {
        self.level += self.indent;
        f(self);
        self.level -= self.indent;
    }

    fn arguments(&mut self, args: &Arguments) {
        let positional = args.positional.iter().map(|v| (None, v));
        let keywords = args.keywords.iter().map(|(k, v)| (Some(k.as_str()), v));
        self.list(positional.chain(keywords));
    }

    fn list<'v>(&mut self, entries: impl Iterator<Item = (Option<&'v str>, &'v Value)>) {
        let entries: Vec<_> = entries.collect();
        let break_args = entries.len() > self.arg_newline_cutoff
            || entries.iter().any(|(_, v)| !v.is_elementary());

        if break_args && !entries.is_empty() {
            self.newline();
        }

        let last = entries.len().saturating_sub(1);
        for (i, (key, value)) in entries.into_iter().enumerate() {
            if let Some(key) = key {
                self.append(key);
                self.append(" : ");
            }
            self.value(value);
            if break_args {
                self.append(",");
                self.newline();
            } else if i != last {
                self.append(", ");
            }
        }
    }
}

/// Single-quote `s`, escaping backslashes, quotes and newlines.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Render `block` with the default layout.
pub fn render(block: &CodeBlock) -> String {
    Printer::default().print(block)
}
