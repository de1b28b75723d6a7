//! Statement nodes of the declarative build language.
//!
//! Only the shapes the synthesizer emits are modelled: literals, identifiers,
//! arrays, function and method calls, and assignments. Build declarations are
//! first described by typed structs ([`TargetDeclaration`],
//! [`DependencyDeclaration`]) and then lowered to generic call nodes.

use indexmap::IndexMap;

use crate::convert::language::Language;
use crate::convert::target::TargetFunction;

/// An expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    Bool(bool),
    Id(String),
    Array(Vec<Value>),
    Call(FunctionCall),
    Method(MethodCall),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Value {
        Value::String(s.into())
    }

    pub fn id(s: impl Into<String>) -> Value {
        Value::Id(s.into())
    }

    pub fn strings<I, S>(items: I) -> Value
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::Array(items.into_iter().map(Value::string).collect())
    }

    pub fn ids<I, S>(items: I) -> Value
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::Array(items.into_iter().map(Value::id).collect())
    }

    /// Literals and identifiers.
    pub fn is_elementary(&self) -> bool {
        matches!(self, Value::String(_) | Value::Bool(_) | Value::Id(_))
    }
}

/// Positional and keyword arguments of a call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    pub positional: Vec<Value>,
    pub keywords: IndexMap<String, Value>,
}

impl Arguments {
    pub fn new(positional: Vec<Value>) -> Self {
        Arguments {
            positional,
            keywords: IndexMap::new(),
        }
    }

    pub fn keyword(mut self, key: impl Into<String>, value: Value) -> Self {
        self.keywords.insert(key.into(), value);
        self
    }

    pub fn len(&self) -> usize {
        self.positional.len() + self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.positional.iter().chain(self.keywords.values())
    }
}

/// `name(args)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Arguments,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Arguments) -> Self {
        FunctionCall {
            name: name.into(),
            args,
        }
    }
}

/// `object.name(args)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub object: Box<Value>,
    pub name: String,
    pub args: Arguments,
}

impl MethodCall {
    pub fn new(object: Value, name: impl Into<String>, args: Arguments) -> Self {
        MethodCall {
            object: Box::new(object),
            name: name.into(),
            args,
        }
    }
}

/// A top-level statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Expression(Value),
    Assignment { name: String, value: Value },
}

impl Statement {
    pub fn assign(name: impl Into<String>, value: Value) -> Self {
        Statement::Assignment {
            name: name.into(),
            value,
        }
    }

    /// Name bound by this statement, if any.
    pub fn binding(&self) -> Option<&str> {
        match self {
            Statement::Assignment { name, .. } => Some(name),
            Statement::Expression(_) => None,
        }
    }

    /// The call this statement evaluates, if any.
    pub fn call(&self) -> Option<&FunctionCall> {
        match self {
            Statement::Expression(Value::Call(call))
            | Statement::Assignment {
                value: Value::Call(call),
                ..
            } => Some(call),
            _ => None,
        }
    }
}

/// An ordered sequence of statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBlock {
    pub lines: Vec<Statement>,
}

impl CodeBlock {
    pub fn push(&mut self, statement: Statement) {
        self.lines.push(statement);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Position of the statement binding `name`.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.lines.iter().position(|s| s.binding() == Some(name))
    }
}

/// `project(name, languages...)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDeclaration {
    pub name: String,
    pub languages: Vec<Language>,
}

impl ProjectDeclaration {
    pub fn to_statement(&self) -> Statement {
        let mut positional = vec![Value::string(&self.name)];
        positional.extend(self.languages.iter().map(|l| Value::string(l.as_str())));
        Statement::Expression(Value::Call(FunctionCall::new(
            "project",
            Arguments::new(positional),
        )))
    }
}

/// Position-independence attribute; the key depends on the target function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionIndependence {
    Pie(bool),
    Pic(bool),
}

impl PositionIndependence {
    pub fn for_function(function: TargetFunction, enabled: bool) -> Option<Self> {
        match function {
            TargetFunction::Executable => Some(PositionIndependence::Pie(enabled)),
            TargetFunction::StaticLibrary => Some(PositionIndependence::Pic(enabled)),
            TargetFunction::SharedLibrary | TargetFunction::SharedModule => None,
        }
    }

    fn keyword(&self) -> (&'static str, bool) {
        match *self {
            PositionIndependence::Pie(v) => ("pie", v),
            PositionIndependence::Pic(v) => ("pic", v),
        }
    }
}

/// Attributes of a build target declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetAttributes {
    pub link_args: Vec<String>,
    /// Identifiers of linked target bindings.
    pub link_with: Vec<String>,
    /// Identifier of the include directories binding.
    pub include_directories: String,
    pub install: bool,
    pub install_dir: Option<String>,
    pub override_options: Vec<String>,
    /// Identifiers of object library bindings whose objects are extracted.
    pub objects: Vec<String>,
    pub compile_args: IndexMap<Language, Vec<String>>,
    pub position_independence: Option<PositionIndependence>,
}

impl TargetAttributes {
    fn to_keywords(&self, args: Arguments) -> Arguments {
        let objects = self
            .objects
            .iter()
            .map(|obj| {
                Value::Method(MethodCall::new(
                    Value::id(obj),
                    "extract_all_objects",
                    Arguments::default(),
                ))
            })
            .collect();

        let mut args = args
            .keyword("link_args", Value::strings(&self.link_args))
            .keyword("link_with", Value::ids(&self.link_with))
            .keyword("include_directories", Value::id(&self.include_directories))
            .keyword("install", Value::Bool(self.install));
        if let Some(dir) = &self.install_dir {
            args = args.keyword("install_dir", Value::string(dir));
        }
        args = args
            .keyword("override_options", Value::strings(&self.override_options))
            .keyword("objects", Value::Array(objects));

        for (lang, flags) in &self.compile_args {
            args = args.keyword(format!("{}_args", lang), Value::strings(flags));
        }

        if let Some(pi) = self.position_independence {
            let (key, enabled) = pi.keyword();
            args = args.keyword(key, Value::Bool(enabled));
        }

        args
    }
}

/// `<binding> = <function>(<name>, <sources>, attributes...)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDeclaration {
    pub binding: String,
    pub function: TargetFunction,
    pub name: String,
    /// Identifier of the sources binding.
    pub sources: String,
    pub attributes: TargetAttributes,
}

impl TargetDeclaration {
    pub fn to_statement(&self) -> Statement {
        let args = Arguments::new(vec![Value::string(&self.name), Value::id(&self.sources)]);
        let call = FunctionCall::new(self.function.as_str(), self.attributes.to_keywords(args));
        Statement::assign(&self.binding, Value::Call(call))
    }
}

/// Attributes of a re-exportable dependency.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyAttributes {
    pub link_args: Vec<String>,
    /// Identifier of the target binding.
    pub link_with: String,
    /// Identifier of the include directories binding.
    pub include_directories: String,
}

/// `<binding> = declare_dependency(attributes...)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDeclaration {
    pub binding: String,
    pub attributes: DependencyAttributes,
}

impl DependencyDeclaration {
    pub fn to_statement(&self) -> Statement {
        let args = Arguments::default()
            .keyword("link_args", Value::strings(&self.attributes.link_args))
            .keyword("link_with", Value::id(&self.attributes.link_with))
            .keyword(
                "include_directories",
                Value::id(&self.attributes.include_directories),
            );
        Statement::assign(
            &self.binding,
            Value::Call(FunctionCall::new("declare_dependency", args)),
        )
    }
}

/// `<binding> = <function>(<paths>...)`, used for include dirs and file lists.
pub fn path_list(binding: &str, function: &str, paths: impl IntoIterator<Item = String>) -> Statement {
    let positional = paths.into_iter().map(Value::String).collect();
    Statement::assign(
        binding,
        Value::Call(FunctionCall::new(function, Arguments::new(positional))),
    )
}
