//! Symbol and literal resolution.
//!
//! Resolution is a fallback chain: the symbol table (which follows imports
//! and re-exports) is asked first, then the file is scanned for nested
//! declarations of the same name. Every chase through identifiers, member
//! accesses and initializers is bounded by [`MAX_RESOLUTION_DEPTH`].
use oxc_ast::ast::{
  ArrowFunctionExpression,
  Expression,
  Function,
  Statement,
  StaticMemberExpression,
  TSEnumDeclaration,
  TSEnumMemberName,
  TemplateLiteral,
};
use oxc_span::{GetSpan, Span};
use oxc_syntax::operator::UnaryOperator;

use crate::{
  error::{ErrorKind, Extracted, ExtractionError},
  known_enums,
  navigator::{EntryKind, as_object, find_property, unwrap_expression},
  project::{FileId, Project},
  symbols::{Declaration, Symbol, SymbolTable},
  value::Value,
};

/// Upper bound on nested resolution steps for one query.
pub const MAX_RESOLUTION_DEPTH: usize = 16;

/// An expression together with the file it was found in.
#[derive(Debug, Clone, Copy)]
pub struct Located<'a> {
  pub file: FileId,
  pub expr: &'a Expression<'a>,
}

/// A function a call expression's callee resolved to.
#[derive(Debug, Clone, Copy)]
pub enum FunctionLike<'a> {
  Arrow(&'a ArrowFunctionExpression<'a>),
  Function(&'a Function<'a>),
}

impl<'a> FunctionLike<'a> {
  #[must_use]
  pub fn param_count(&self) -> usize {
    match self {
      Self::Arrow(arrow) => arrow.params.items.len(),
      Self::Function(func) => func.params.items.len(),
    }
  }

  /// The expression the function returns: the body of an expression arrow,
  /// or the first top-level `return` of a block body.
  #[must_use]
  pub fn returned_expression(&self) -> Option<&'a Expression<'a>> {
    let statements = match self {
      Self::Arrow(arrow) => {
        if arrow.expression {
          return match arrow.body.statements.first()? {
            Statement::ExpressionStatement(stmt) => Some(&stmt.expression),
            _ => None,
          };
        }
        &arrow.body.statements
      },
      Self::Function(func) => &func.body.as_ref()?.statements,
    };

    statements.iter().find_map(|stmt| {
      match stmt {
        Statement::ReturnStatement(ret) => ret.argument.as_ref(),
        _ => None,
      }
    })
  }
}

enum MemberTarget<'a> {
  Expr(Located<'a>),
  Value(Value),
  Getter(Span),
}

/// Resolution context: a project and the file whose scope names are looked
/// up in.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'p, 'a> {
  project: &'p Project<'a>,
  file:    FileId,
}

impl<'p, 'a> Resolver<'p, 'a> {
  #[must_use]
  pub const fn new(project: &'p Project<'a>, file: FileId) -> Self {
    Self { project, file }
  }

  /// The same resolver, scoped to another file of the project.
  #[must_use]
  pub const fn at(&self, file: FileId) -> Self {
    Self {
      project: self.project,
      file,
    }
  }

  #[must_use]
  pub const fn file(&self) -> FileId {
    self.file
  }

  #[must_use]
  pub const fn project(&self) -> &'p Project<'a> {
    self.project
  }

  #[must_use]
  pub fn source(&self) -> &'a str {
    self.project.file(self.file).source
  }

  /// Source text of a node in the current file.
  #[must_use]
  pub fn text(&self, span: Span) -> &'a str {
    let source = self.source();
    source
      .get(span.start as usize..span.end as usize)
      .unwrap_or_default()
  }

  /// Find the declaration `name` refers to, trying each resolution strategy
  /// in order and stopping at the first hit.
  #[must_use]
  pub fn declaration(&self, name: &str) -> Option<Symbol<'a>> {
    let strategies: [(&str, fn(&SymbolTable<'a>, FileId, &str) -> Option<Symbol<'a>>); 2] = [
      ("symbol table", SymbolTable::lookup),
      ("same-file scan", SymbolTable::scan_local),
    ];

    let symbols = self.project.symbols();
    strategies.iter().find_map(|(strategy, resolve)| {
      let found = resolve(symbols, self.file, name);
      if found.is_some() {
        log::trace!("nixplug-extract: `{name}` resolved via {strategy}");
      }
      found
    })
  }

  /// Follow an identifier to the expression its declaration ultimately holds,
  /// unwrapping casts and chasing further references.
  #[must_use]
  pub fn resolve_identifier(&self, name: &str) -> Option<Located<'a>> {
    self.identifier_at_depth(name, 0)
  }

  /// Like [`Self::resolve_identifier`] for an identifier or member access
  /// expression. Any other expression yields `None`.
  #[must_use]
  pub fn resolve_reference(&self, expr: &'a Expression<'a>) -> Option<Located<'a>> {
    match unwrap_expression(expr) {
      Expression::Identifier(id) => self.resolve_identifier(id.name.as_str()),
      Expression::StaticMemberExpression(member) => {
        match self.member_target(member, 0)? {
          MemberTarget::Expr(located) => Some(located),
          MemberTarget::Value(_) | MemberTarget::Getter(_) => None,
        }
      },
      _ => None,
    }
  }

  fn identifier_at_depth(&self, name: &str, depth: usize) -> Option<Located<'a>> {
    if depth > MAX_RESOLUTION_DEPTH {
      log::debug!("nixplug-extract: giving up on `{name}` after {depth} hops");
      return None;
    }
    let symbol = self.declaration(name)?;
    let Declaration::Variable { init: Some(init), .. } = symbol.declaration else {
      return None;
    };
    self.at(symbol.file).chase(init, depth + 1)
  }

  fn chase(&self, expr: &'a Expression<'a>, depth: usize) -> Option<Located<'a>> {
    if depth > MAX_RESOLUTION_DEPTH {
      return None;
    }
    let inner = unwrap_expression(expr);
    let here = Located {
      file: self.file,
      expr: inner,
    };
    match inner {
      Expression::Identifier(id) if id.name.as_str() != "undefined" => {
        self.identifier_at_depth(id.name.as_str(), depth)
      },
      Expression::StaticMemberExpression(member) => {
        match self.member_target(member, depth + 1) {
          Some(MemberTarget::Expr(located)) => Some(located),
          _ => Some(here),
        }
      },
      _ => Some(here),
    }
  }

  fn member_target(
    &self,
    member: &'a StaticMemberExpression<'a>,
    depth: usize,
  ) -> Option<MemberTarget<'a>> {
    if depth > MAX_RESOLUTION_DEPTH {
      return None;
    }
    let property = member.property.name.as_str();

    match unwrap_expression(&member.object) {
      Expression::Identifier(id) => {
        let symbol = self.declaration(id.name.as_str())?;
        let scoped = self.at(symbol.file);
        match symbol.declaration {
          Declaration::Enum(decl) => {
            scoped
              .enum_member(decl, property, depth + 1)
              .map(MemberTarget::Value)
          },
          Declaration::Variable { init: Some(init), .. } => {
            let base = scoped.chase(init, depth + 1)?;
            self.at(base.file).object_property(base.expr, property, depth + 1)
          },
          _ => None,
        }
      },
      Expression::StaticMemberExpression(inner) => {
        match self.member_target(inner, depth + 1)? {
          MemberTarget::Expr(base) => {
            self.at(base.file).object_property(base.expr, property, depth + 1)
          },
          MemberTarget::Value(_) | MemberTarget::Getter(_) => None,
        }
      },
      _ => None,
    }
  }

  /// One level of object-literal lookup: `A.B` where `A` is `{ B: ... }`,
  /// possibly wrapped in `as const`.
  fn object_property(
    &self,
    expr: &'a Expression<'a>,
    property: &str,
    depth: usize,
  ) -> Option<MemberTarget<'a>> {
    let object = as_object(expr)?;
    let entry = find_property(object, property)?;
    match entry.kind {
      EntryKind::Getter => Some(MemberTarget::Getter(entry.property.span)),
      EntryKind::Value => {
        let located = self.chase(entry.value, depth + 1).unwrap_or(Located {
          file: self.file,
          expr: entry.value,
        });
        Some(MemberTarget::Expr(located))
      },
      EntryKind::Setter | EntryKind::Method => None,
    }
  }

  /// Value of an enum member, honouring TypeScript's auto-increment for
  /// members without an initializer.
  fn enum_member(
    &self,
    decl: &'a TSEnumDeclaration<'a>,
    member: &str,
    depth: usize,
  ) -> Option<Value> {
    self
      .enum_values(decl, depth)
      .into_iter()
      .find(|(name, _)| *name == member)
      .and_then(|(_, value)| value)
  }

  fn enum_values(
    &self,
    decl: &'a TSEnumDeclaration<'a>,
    depth: usize,
  ) -> Vec<(&'a str, Option<Value>)> {
    let mut next_auto = Some(0_i64);
    let mut out = Vec::with_capacity(decl.body.members.len());
    for m in &decl.body.members {
      let value = match &m.initializer {
        Some(init) => self.literal_at_depth(init, depth + 1).value(),
        None => next_auto.map(Value::Int),
      };
      next_auto = match &value {
        Some(Value::Int(i)) => i.checked_add(1),
        _ => None,
      };
      if let Some(name) = enum_member_name(&m.id) {
        out.push((name, value));
      }
    }
    out
  }

  /// Members of the enum `name` refers to, in declaration order. Members
  /// whose value cannot be evaluated are left out.
  #[must_use]
  pub fn enum_members(&self, name: &str) -> Option<Vec<(&'a str, Value)>> {
    let symbol = self.declaration(name)?;
    let Declaration::Enum(decl) = symbol.declaration else {
      return None;
    };
    Some(
      self
        .at(symbol.file)
        .enum_values(decl, 0)
        .into_iter()
        .filter_map(|(name, value)| value.map(|value| (name, value)))
        .collect(),
    )
  }

  /// Resolve an enum-member-like property access to its backing literal.
  ///
  /// Falls back to the known external enum table when the base has no
  /// declaration we can see.
  #[must_use]
  pub fn resolve_member(&self, member: &'a StaticMemberExpression<'a>) -> Extracted<Value> {
    self.member_at_depth(member, 0)
  }

  fn member_at_depth(
    &self,
    member: &'a StaticMemberExpression<'a>,
    depth: usize,
  ) -> Extracted<Value> {
    match self.member_target(member, depth) {
      Some(MemberTarget::Value(value)) => Extracted::Value(value),
      Some(MemberTarget::Expr(located)) => {
        self.at(located.file).literal_at_depth(located.expr, depth + 1)
      },
      Some(MemberTarget::Getter(span)) => {
        Extracted::Failed(ExtractionError::new(
          ErrorKind::CannotEvaluate,
          format!("`{}` is a getter", self.text(member.span)),
          span,
        ))
      },
      None => {
        if let Expression::Identifier(base) = unwrap_expression(&member.object)
          && let Some(value) =
            known_enums::lookup(base.name.as_str(), member.property.name.as_str())
        {
          return Extracted::Value(Value::Int(value));
        }
        Extracted::Failed(ExtractionError::new(
          ErrorKind::UnresolvableSymbol,
          format!("cannot resolve `{}`", self.text(member.span)),
          member.span,
        ))
      },
    }
  }

  /// Evaluate a primitive literal: strings, substitution-free templates,
  /// numbers (including negated ones), big integers, booleans, `null` and
  /// `undefined`, and references that resolve to one of those.
  #[must_use]
  pub fn literal(&self, expr: &'a Expression<'a>) -> Extracted<Value> {
    self.literal_at_depth(expr, 0)
  }

  fn literal_at_depth(&self, expr: &'a Expression<'a>, depth: usize) -> Extracted<Value> {
    if depth > MAX_RESOLUTION_DEPTH {
      return Extracted::Failed(ExtractionError::new(
        ErrorKind::UnresolvableSymbol,
        "resolution depth exceeded",
        expr.span(),
      ));
    }

    let expr = unwrap_expression(expr);
    match expr {
      Expression::StringLiteral(lit) => Extracted::Value(Value::Str(lit.value.to_string())),
      Expression::TemplateLiteral(template) => {
        template_text(template).map_or_else(
          || {
            Extracted::Failed(ExtractionError::new(
              ErrorKind::CannotEvaluate,
              "template literal has substitutions",
              template.span,
            ))
          },
          |text| Extracted::Value(Value::Str(text)),
        )
      },
      Expression::NumericLiteral(lit) => Extracted::Value(Value::from_number(lit.value)),
      Expression::BigIntLiteral(lit) => {
        Extracted::Value(Value::Str(bigint_decimal(self.text(lit.span))))
      },
      Expression::BooleanLiteral(lit) => Extracted::Value(Value::Bool(lit.value)),
      Expression::NullLiteral(_) => Extracted::Value(Value::Null),
      Expression::UnaryExpression(unary)
        if unary.operator == UnaryOperator::UnaryNegation =>
      {
        match self.literal_at_depth(&unary.argument, depth + 1) {
          Extracted::Value(Value::Int(i)) => {
            i.checked_neg().map_or(Extracted::Value(Value::Float(-(i as f64))), |n| {
              Extracted::Value(Value::Int(n))
            })
          },
          Extracted::Value(Value::Float(f)) => Extracted::Value(Value::Float(-f)),
          Extracted::Failed(e) => Extracted::Failed(e),
          _ => {
            Extracted::Failed(ExtractionError::new(
              ErrorKind::CannotEvaluate,
              "negation of a non-numeric value",
              unary.span,
            ))
          },
        }
      },
      Expression::Identifier(id) if id.name.as_str() == "undefined" => {
        Extracted::Value(Value::Null)
      },
      Expression::Identifier(id) => {
        match self.identifier_at_depth(id.name.as_str(), depth + 1) {
          Some(located) => self.at(located.file).literal_at_depth(located.expr, depth + 1),
          None => {
            Extracted::Failed(ExtractionError::new(
              ErrorKind::UnresolvableSymbol,
              format!("no declaration found for `{}`", id.name.as_str()),
              id.span,
            ))
          },
        }
      },
      Expression::StaticMemberExpression(member) => self.member_at_depth(member, depth + 1),
      other => {
        Extracted::Failed(ExtractionError::new(
          ErrorKind::CannotEvaluate,
          format!("`{}` is not a literal", self.text(other.span())),
          other.span(),
        ))
      },
    }
  }

  /// Resolve a callee to a function whose body we can inspect.
  #[must_use]
  pub fn resolve_function(
    &self,
    callee: &'a Expression<'a>,
  ) -> Option<(Self, FunctionLike<'a>)> {
    match unwrap_expression(callee) {
      Expression::ArrowFunctionExpression(arrow) => Some((*self, FunctionLike::Arrow(arrow))),
      Expression::FunctionExpression(func) => Some((*self, FunctionLike::Function(func))),
      Expression::Identifier(id) => {
        let symbol = self.declaration(id.name.as_str())?;
        let scoped = self.at(symbol.file);
        match symbol.declaration {
          Declaration::Function(func) => Some((scoped, FunctionLike::Function(func))),
          Declaration::Variable { init: Some(init), .. } => {
            match unwrap_expression(init) {
              Expression::ArrowFunctionExpression(arrow) => {
                Some((scoped, FunctionLike::Arrow(arrow)))
              },
              Expression::FunctionExpression(func) => {
                Some((scoped, FunctionLike::Function(func)))
              },
              _ => None,
            }
          },
          _ => None,
        }
      },
      _ => None,
    }
  }
}

fn enum_member_name<'a>(name: &'a TSEnumMemberName<'a>) -> Option<&'a str> {
  match name {
    TSEnumMemberName::Identifier(id) => Some(id.name.as_str()),
    TSEnumMemberName::String(lit) => Some(lit.value.as_str()),
    _ => None,
  }
}

/// Text of a template literal without substitutions.
#[must_use]
pub fn template_text(template: &TemplateLiteral<'_>) -> Option<String> {
  if !template.expressions.is_empty() {
    return None;
  }
  Some(
    template
      .quasis
      .iter()
      .map(|quasi| {
        quasi
          .value
          .cooked
          .as_ref()
          .map_or_else(|| quasi.value.raw.as_str(), |cooked| cooked.as_str())
      })
      .collect(),
  )
}

/// Decimal text of a big-integer literal (`0x1Fn` → `31`). Values that do not
/// fit in 128 bits keep their digits as written.
#[must_use]
pub fn bigint_decimal(raw: &str) -> String {
  let digits: String = raw.trim_end_matches('n').chars().filter(|c| *c != '_').collect();
  let lower = digits.to_ascii_lowercase();
  let (radix, body) = if let Some(rest) = lower.strip_prefix("0x") {
    (16, rest)
  } else if let Some(rest) = lower.strip_prefix("0o") {
    (8, rest)
  } else if let Some(rest) = lower.strip_prefix("0b") {
    (2, rest)
  } else {
    (10, lower.as_str())
  };
  u128::from_str_radix(body, radix).map_or(digits.clone(), |n| n.to_string())
}
