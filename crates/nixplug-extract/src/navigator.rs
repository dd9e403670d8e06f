//! Value-free traversal helpers.
//!
//! Nothing in here interprets what a node *means*; it only finds call
//! expressions by callee name and enumerates the entries of object literals.
use oxc_ast::ast::{
  ArrayExpression,
  CallExpression,
  Declaration,
  Expression,
  ObjectExpression,
  ObjectProperty,
  ObjectPropertyKind,
  Program,
  PropertyKey,
  PropertyKind,
  Statement,
};

/// Callee of the settings definition call.
pub const SETTINGS_DEFINITION: &str = "definePluginSettings";

/// Callee of the plugin definition call.
pub const PLUGIN_DEFINITION: &str = "definePlugin";

/// How an object literal entry is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
  /// `key: value` or shorthand `key`.
  Value,
  /// `get key() { ... }`
  Getter,
  /// `set key(v) { ... }`
  Setter,
  /// `key() { ... }`
  Method,
}

/// One statically named entry of an object literal.
#[derive(Debug, Clone, Copy)]
pub struct PropertyEntry<'a> {
  pub name:     &'a str,
  pub kind:     EntryKind,
  pub value:    &'a Expression<'a>,
  pub property: &'a ObjectProperty<'a>,
}

impl PropertyEntry<'_> {
  #[must_use]
  pub fn is_getter(&self) -> bool {
    self.kind == EntryKind::Getter
  }
}

/// Lazy, restartable sequence over the statically named entries of an object
/// literal. Spread entries and computed keys are skipped.
#[derive(Debug, Clone)]
pub struct PropertyEntries<'a> {
  inner: std::slice::Iter<'a, ObjectPropertyKind<'a>>,
}

impl<'a> Iterator for PropertyEntries<'a> {
  type Item = PropertyEntry<'a>;

  fn next(&mut self) -> Option<Self::Item> {
    for kind in self.inner.by_ref() {
      let ObjectPropertyKind::ObjectProperty(property) = kind else {
        continue;
      };
      if property.computed {
        continue;
      }
      let Some(name) = key_name(&property.key) else {
        continue;
      };
      let kind = match property.kind {
        PropertyKind::Get => EntryKind::Getter,
        PropertyKind::Set => EntryKind::Setter,
        PropertyKind::Init if property.method => EntryKind::Method,
        PropertyKind::Init => EntryKind::Value,
      };
      return Some(PropertyEntry {
        name,
        kind,
        value: &property.value,
        property,
      });
    }
    None
  }
}

/// Enumerate the entries of `object`.
#[must_use]
pub fn properties<'a>(object: &'a ObjectExpression<'a>) -> PropertyEntries<'a> {
  PropertyEntries {
    inner: object.properties.iter(),
  }
}

/// Find an entry by name. Later duplicates win, matching JavaScript.
#[must_use]
pub fn find_property<'a>(
  object: &'a ObjectExpression<'a>,
  name: &str,
) -> Option<PropertyEntry<'a>> {
  properties(object).filter(|entry| entry.name == name).last()
}

#[must_use]
pub fn has_property(object: &ObjectExpression<'_>, name: &str) -> bool {
  properties(object).any(|entry| entry.name == name)
}

/// Static name of a property key: identifiers, string and numeric literals.
#[must_use]
pub fn key_name<'a>(key: &'a PropertyKey<'a>) -> Option<&'a str> {
  match key {
    PropertyKey::StaticIdentifier(id) => Some(id.name.as_str()),
    PropertyKey::StringLiteral(lit) => Some(lit.value.as_str()),
    PropertyKey::NumericLiteral(lit) => lit.raw.as_ref().map(|raw| raw.as_str()),
    _ => None,
  }
}

/// Strip parentheses and type-level wrappers (`as`, `satisfies`, `<T>x`,
/// `x!`) that do not change the runtime value.
#[must_use]
pub fn unwrap_expression<'a>(expr: &'a Expression<'a>) -> &'a Expression<'a> {
  let mut current = expr;
  loop {
    current = match current {
      Expression::ParenthesizedExpression(e) => &e.expression,
      Expression::TSAsExpression(e) => &e.expression,
      Expression::TSSatisfiesExpression(e) => &e.expression,
      Expression::TSTypeAssertion(e) => &e.expression,
      Expression::TSNonNullExpression(e) => &e.expression,
      _ => return current,
    };
  }
}

#[must_use]
pub fn as_object<'a>(expr: &'a Expression<'a>) -> Option<&'a ObjectExpression<'a>> {
  match unwrap_expression(expr) {
    Expression::ObjectExpression(object) => Some(object),
    _ => None,
  }
}

#[must_use]
pub fn as_array<'a>(expr: &'a Expression<'a>) -> Option<&'a ArrayExpression<'a>> {
  match unwrap_expression(expr) {
    Expression::ArrayExpression(array) => Some(array),
    _ => None,
  }
}

/// Name of a call's callee: `foo(...)` → `foo`, `a.b.foo(...)` → `foo`.
#[must_use]
pub fn callee_name<'a>(call: &'a CallExpression<'a>) -> Option<&'a str> {
  match unwrap_expression(&call.callee) {
    Expression::Identifier(id) => Some(id.name.as_str()),
    Expression::StaticMemberExpression(member) => Some(member.property.name.as_str()),
    _ => None,
  }
}

/// First argument of a call as an expression (spread arguments excluded).
#[must_use]
pub fn first_argument<'a>(call: &'a CallExpression<'a>) -> Option<&'a Expression<'a>> {
  call.arguments.first().and_then(|arg| arg.as_expression())
}

/// Every call in `program` whose callee is named `name`, in source order.
///
/// Only the places a definition call realistically sits are walked: variable
/// initializers, export defaults, expression statements, and anything nested
/// inside call arguments, member chains, object and array literals there.
#[must_use]
pub fn find_calls<'a>(program: &'a Program<'a>, name: &str) -> Vec<&'a CallExpression<'a>> {
  let mut out = Vec::new();
  for stmt in &program.body {
    walk_statement(stmt, name, &mut out);
  }
  out
}

fn walk_statement<'a>(
  stmt: &'a Statement<'a>,
  name: &str,
  out: &mut Vec<&'a CallExpression<'a>>,
) {
  match stmt {
    Statement::VariableDeclaration(decl) => {
      for declarator in &decl.declarations {
        if let Some(init) = &declarator.init {
          walk_expression(init, name, out);
        }
      }
    },
    Statement::ExportNamedDeclaration(decl) => {
      if let Some(Declaration::VariableDeclaration(var)) = &decl.declaration {
        for declarator in &var.declarations {
          if let Some(init) = &declarator.init {
            walk_expression(init, name, out);
          }
        }
      }
    },
    Statement::ExportDefaultDeclaration(decl) => {
      if let Some(expr) = decl.declaration.as_expression() {
        walk_expression(expr, name, out);
      }
    },
    Statement::ExpressionStatement(stmt) => walk_expression(&stmt.expression, name, out),
    _ => {},
  }
}

fn walk_expression<'a>(
  expr: &'a Expression<'a>,
  name: &str,
  out: &mut Vec<&'a CallExpression<'a>>,
) {
  match unwrap_expression(expr) {
    Expression::CallExpression(call) => {
      if callee_name(call) == Some(name)
        && matches!(unwrap_expression(&call.callee), Expression::Identifier(_))
      {
        out.push(call);
      }
      walk_expression(&call.callee, name, out);
      for arg in &call.arguments {
        if let Some(arg) = arg.as_expression() {
          walk_expression(arg, name, out);
        }
      }
    },
    Expression::StaticMemberExpression(member) => {
      walk_expression(&member.object, name, out);
    },
    Expression::ObjectExpression(object) => {
      for entry in properties(object) {
        if entry.kind == EntryKind::Value {
          walk_expression(entry.value, name, out);
        }
      }
    },
    Expression::ArrayExpression(array) => {
      for element in &array.elements {
        if let Some(element) = element.as_expression() {
          walk_expression(element, name, out);
        }
      }
    },
    _ => {},
  }
}
