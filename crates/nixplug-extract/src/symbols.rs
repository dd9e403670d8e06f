//! Declaration index over a [`Project`](crate::Project).
//!
//! This is the "symbol table" the resolver queries: which declaration does a
//! name refer to, following imports and re-exports across files. Only
//! module-level bindings are indexed; [`SymbolTable::scan_local`] covers the
//! nested declarations the index does not.
use std::collections::HashMap;

use oxc_ast::ast::{
  Declaration as AstDeclaration,
  ExportDefaultDeclarationKind,
  Expression,
  Function,
  ImportDeclarationSpecifier,
  Statement,
  TSEnumDeclaration,
  VariableDeclarator,
};
use oxc_span::{GetSpan, Span};

use crate::project::{FileId, SourceFile};

/// Upper bound on import/re-export hops followed for one lookup. Alias
/// cycles end here instead of looping.
pub const MAX_ALIAS_HOPS: usize = 16;

/// A declaration a name can resolve to.
#[derive(Debug, Clone, Copy)]
pub enum Declaration<'a> {
  /// `const`/`let`/`var` binding, or the expression of `export default`.
  Variable {
    init: Option<&'a Expression<'a>>,
    span: Span,
  },
  Enum(&'a TSEnumDeclaration<'a>),
  Function(&'a Function<'a>),
}

impl Declaration<'_> {
  #[must_use]
  pub fn span(&self) -> Span {
    match self {
      Self::Variable { span, .. } => *span,
      Self::Enum(decl) => decl.span,
      Self::Function(func) => func.span,
    }
  }
}

/// A resolved declaration together with the file it lives in.
#[derive(Debug, Clone, Copy)]
pub struct Symbol<'a> {
  pub file:        FileId,
  pub declaration: Declaration<'a>,
}

#[derive(Debug, Clone, Copy)]
enum ImportedName<'a> {
  Named(&'a str),
  Default,
  Namespace,
}

#[derive(Debug, Clone, Copy)]
enum Binding<'a> {
  Local(Declaration<'a>),
  Import {
    module:   &'a str,
    imported: ImportedName<'a>,
  },
}

#[derive(Debug, Clone, Copy)]
enum ExportTarget<'a> {
  Local(&'a str),
  ReExport { module: &'a str, name: &'a str },
  Default(Declaration<'a>),
}

#[derive(Debug, Default)]
struct FileSymbols<'a> {
  bindings:     HashMap<&'a str, Binding<'a>>,
  exports:      HashMap<&'a str, ExportTarget<'a>>,
  star_exports: Vec<&'a str>,
}

/// Module-level declarations of every file in a project.
#[derive(Debug, Default)]
pub struct SymbolTable<'a> {
  files:   Vec<FileSymbols<'a>>,
  sources: Vec<&'a [Statement<'a>]>,
  modules: HashMap<(FileId, String), FileId>,
}

impl<'a> SymbolTable<'a> {
  pub(crate) fn build(
    files: &[SourceFile<'a>],
    modules: HashMap<(FileId, String), FileId>,
  ) -> Self {
    let mut table = Self {
      files: Vec::with_capacity(files.len()),
      sources: Vec::with_capacity(files.len()),
      modules,
    };

    for file in files {
      let program = file.program;
      let mut symbols = FileSymbols::default();
      for stmt in &program.body {
        index_statement(stmt, &mut symbols);
      }
      table.files.push(symbols);
      table.sources.push(program.body.as_slice());
    }

    table
  }

  /// Resolve `name` as seen from `file`: local declarations first, then
  /// imports followed through exports of the imported module.
  #[must_use]
  pub fn lookup(&self, file: FileId, name: &str) -> Option<Symbol<'a>> {
    self.lookup_hops(file, name, 0)
  }

  fn lookup_hops(
    &self,
    file: FileId,
    name: &str,
    hops: usize,
  ) -> Option<Symbol<'a>> {
    if hops > MAX_ALIAS_HOPS {
      log::debug!("nixplug-extract: alias chain for `{name}` exceeded hop limit");
      return None;
    }

    match self.files.get(file)?.bindings.get(name)? {
      Binding::Local(declaration) => {
        Some(Symbol {
          file,
          declaration: *declaration,
        })
      },
      Binding::Import { module, imported } => {
        let target = self.module(file, module)?;
        match imported {
          ImportedName::Named(exported) => {
            self.lookup_export(target, exported, hops + 1)
          },
          ImportedName::Default => self.lookup_export(target, "default", hops + 1),
          // Namespace objects are not modelled as values.
          ImportedName::Namespace => None,
        }
      },
    }
  }

  /// Resolve an export of `file` by its exported name.
  #[must_use]
  pub fn export(&self, file: FileId, name: &str) -> Option<Symbol<'a>> {
    self.lookup_export(file, name, 0)
  }

  fn lookup_export(
    &self,
    file: FileId,
    name: &str,
    hops: usize,
  ) -> Option<Symbol<'a>> {
    if hops > MAX_ALIAS_HOPS {
      return None;
    }

    let symbols = self.files.get(file)?;
    match symbols.exports.get(name) {
      Some(ExportTarget::Local(local)) => self.lookup_hops(file, local, hops + 1),
      Some(ExportTarget::ReExport { module, name }) => {
        let target = self.module(file, module)?;
        self.lookup_export(target, name, hops + 1)
      },
      Some(ExportTarget::Default(declaration)) => {
        Some(Symbol {
          file,
          declaration: *declaration,
        })
      },
      None => {
        symbols.star_exports.iter().find_map(|module| {
          let target = self.module(file, module)?;
          self.lookup_export(target, name, hops + 1)
        })
      },
    }
  }

  /// Does `name` refer to an import from a module we did not load?
  #[must_use]
  pub fn is_external_import(&self, file: FileId, name: &str) -> bool {
    matches!(
      self.files.get(file).and_then(|f| f.bindings.get(name)),
      Some(Binding::Import { module, .. }) if self.module(file, module).is_none()
    )
  }

  fn module(&self, file: FileId, specifier: &str) -> Option<FileId> {
    self.modules.get(&(file, specifier.to_string())).copied()
  }

  /// Scan every declaration in `file`, including ones nested in function
  /// bodies and blocks, for a binding named `name`. The first match in source
  /// order wins.
  #[must_use]
  pub fn scan_local(&self, file: FileId, name: &str) -> Option<Symbol<'a>> {
    let statements = self.sources.get(file)?;
    scan_statements(statements, name).map(|declaration| {
      Symbol { file, declaration }
    })
  }
}

fn index_statement<'a>(stmt: &'a Statement<'a>, out: &mut FileSymbols<'a>) {
  match stmt {
    Statement::VariableDeclaration(decl) => {
      for declarator in &decl.declarations {
        index_declarator(declarator, out);
      }
    },
    Statement::TSEnumDeclaration(decl) => {
      out
        .bindings
        .insert(decl.id.name.as_str(), Binding::Local(Declaration::Enum(decl)));
    },
    Statement::FunctionDeclaration(func) => {
      if let Some(id) = &func.id {
        out
          .bindings
          .insert(id.name.as_str(), Binding::Local(Declaration::Function(func)));
      }
    },
    Statement::ImportDeclaration(decl) => {
      let module = decl.source.value.as_str();
      let Some(specifiers) = &decl.specifiers else {
        return;
      };
      for specifier in specifiers {
        let (local, imported) = match specifier {
          ImportDeclarationSpecifier::ImportSpecifier(s) => {
            (s.local.name.as_str(), ImportedName::Named(s.imported.name().as_str()))
          },
          ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
            (s.local.name.as_str(), ImportedName::Default)
          },
          ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
            (s.local.name.as_str(), ImportedName::Namespace)
          },
        };
        out.bindings.insert(local, Binding::Import { module, imported });
      }
    },
    Statement::ExportNamedDeclaration(decl) => {
      if let Some(declaration) = &decl.declaration {
        index_declaration(declaration, out, true);
      }
      for specifier in &decl.specifiers {
        let exported = specifier.exported.name().as_str();
        let local = specifier.local.name().as_str();
        let target = decl.source.as_ref().map_or(ExportTarget::Local(local), |source| {
          ExportTarget::ReExport {
            module: source.value.as_str(),
            name:   local,
          }
        });
        out.exports.insert(exported, target);
      }
    },
    Statement::ExportDefaultDeclaration(decl) => {
      let declaration = match &decl.declaration {
        ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
          Some(Declaration::Function(func))
        },
        kind => {
          kind.as_expression().map(|expr| {
            Declaration::Variable {
              init: Some(expr),
              span: expr.span(),
            }
          })
        },
      };
      if let Some(declaration) = declaration {
        out.exports.insert("default", ExportTarget::Default(declaration));
      }
    },
    Statement::ExportAllDeclaration(decl) => {
      if decl.exported.is_none() {
        out.star_exports.push(decl.source.value.as_str());
      }
    },
    _ => {},
  }
}

fn index_declaration<'a>(
  declaration: &'a AstDeclaration<'a>,
  out: &mut FileSymbols<'a>,
  exported: bool,
) {
  let mut names = Vec::new();
  match declaration {
    AstDeclaration::VariableDeclaration(decl) => {
      for declarator in &decl.declarations {
        if let Some(name) = index_declarator(declarator, out) {
          names.push(name);
        }
      }
    },
    AstDeclaration::TSEnumDeclaration(decl) => {
      let name = decl.id.name.as_str();
      out.bindings.insert(name, Binding::Local(Declaration::Enum(decl)));
      names.push(name);
    },
    AstDeclaration::FunctionDeclaration(func) => {
      if let Some(id) = &func.id {
        let name = id.name.as_str();
        out.bindings.insert(name, Binding::Local(Declaration::Function(func)));
        names.push(name);
      }
    },
    _ => {},
  }

  if exported {
    for name in names {
      out.exports.insert(name, ExportTarget::Local(name));
    }
  }
}

fn index_declarator<'a>(
  declarator: &'a VariableDeclarator<'a>,
  out: &mut FileSymbols<'a>,
) -> Option<&'a str> {
  let (name, declaration) = declarator_binding(declarator)?;
  out.bindings.insert(name, Binding::Local(declaration));
  Some(name)
}

fn declarator_binding<'a>(
  declarator: &'a VariableDeclarator<'a>,
) -> Option<(&'a str, Declaration<'a>)> {
  let name = declarator.id.get_identifier_name()?.as_str();
  Some((name, Declaration::Variable {
    init: declarator.init.as_ref(),
    span: declarator.span,
  }))
}

fn scan_statements<'a>(
  statements: &'a [Statement<'a>],
  name: &str,
) -> Option<Declaration<'a>> {
  statements.iter().find_map(|stmt| scan_statement(stmt, name))
}

fn scan_statement<'a>(
  stmt: &'a Statement<'a>,
  name: &str,
) -> Option<Declaration<'a>> {
  match stmt {
    Statement::VariableDeclaration(decl) => {
      decl.declarations.iter().find_map(|declarator| {
        let (found, declaration) = declarator_binding(declarator)?;
        if found == name {
          return Some(declaration);
        }
        declarator.init.as_ref().and_then(|init| scan_function_like(init, name))
      })
    },
    Statement::TSEnumDeclaration(decl) => {
      (decl.id.name.as_str() == name).then_some(Declaration::Enum(decl))
    },
    Statement::FunctionDeclaration(func) => scan_function(func, name),
    Statement::BlockStatement(block) => scan_statements(&block.body, name),
    Statement::IfStatement(stmt) => {
      scan_statement(&stmt.consequent, name).or_else(|| {
        stmt
          .alternate
          .as_ref()
          .and_then(|alternate| scan_statement(alternate, name))
      })
    },
    Statement::ExportNamedDeclaration(decl) => {
      match decl.declaration.as_ref()? {
        AstDeclaration::VariableDeclaration(var) => {
          var.declarations.iter().find_map(|declarator| {
            let (found, declaration) = declarator_binding(declarator)?;
            (found == name).then_some(declaration)
          })
        },
        AstDeclaration::TSEnumDeclaration(decl) => {
          (decl.id.name.as_str() == name).then_some(Declaration::Enum(decl))
        },
        AstDeclaration::FunctionDeclaration(func) => scan_function(func, name),
        _ => None,
      }
    },
    _ => None,
  }
}

fn scan_function<'a>(
  func: &'a Function<'a>,
  name: &str,
) -> Option<Declaration<'a>> {
  if func.id.as_ref().is_some_and(|id| id.name.as_str() == name) {
    return Some(Declaration::Function(func));
  }
  func
    .body
    .as_ref()
    .and_then(|body| scan_statements(&body.statements, name))
}

/// Descend into arrow/function expression bodies bound to a variable.
fn scan_function_like<'a>(
  expr: &'a Expression<'a>,
  name: &str,
) -> Option<Declaration<'a>> {
  match expr {
    Expression::ArrowFunctionExpression(arrow) => {
      scan_statements(&arrow.body.statements, name)
    },
    Expression::FunctionExpression(func) => scan_function(func, name),
    _ => None,
  }
}

/// Raw type annotation text of a variable declaration (`Entry[]` for
/// `const list: Entry[] = []`), sliced from the declarator source.
#[must_use]
pub fn declared_type<'a>(source: &'a str, declaration: &Declaration<'a>) -> Option<&'a str> {
  let Declaration::Variable { span, init, .. } = declaration else {
    return None;
  };
  let end = init.map_or(span.end, |init| init.span().start);
  let text = source.get(span.start as usize..end as usize)?;
  let (_, after_colon) = text.split_once(':')?;
  let annotation = after_colon.trim().trim_end_matches('=').trim();
  (!annotation.is_empty()).then_some(annotation)
}

#[cfg(test)]
mod tests {
  use oxc_allocator::Allocator;

  use super::*;
  use crate::Project;

  #[test]
  fn test_lookup_local_const() {
    let allocator = Allocator::default();
    let project =
      Project::from_sources(&allocator, [("a.ts", "const A = 1; enum E { X = 2 }")])
        .expect("parse");
    let symbols = project.symbols();
    assert!(matches!(
      symbols.lookup(0, "A").map(|s| s.declaration),
      Some(Declaration::Variable { init: Some(_), .. })
    ));
    assert!(matches!(
      symbols.lookup(0, "E").map(|s| s.declaration),
      Some(Declaration::Enum(_))
    ));
    assert!(symbols.lookup(0, "missing").is_none());
  }

  #[test]
  fn test_lookup_through_reexport_chain() {
    let allocator = Allocator::default();
    let project = Project::from_sources(&allocator, [
      ("p/index.ts", "import { Mode } from \"./barrel\";"),
      ("p/barrel.ts", "export { Inner as Mode } from \"./inner\";"),
      ("p/inner.ts", "export const Inner = \"dark\";"),
    ])
    .expect("parse");
    let symbol = project.symbols().lookup(0, "Mode").expect("resolves");
    assert_eq!(symbol.file, 2);
  }

  #[test]
  fn test_lookup_through_star_export() {
    let allocator = Allocator::default();
    let project = Project::from_sources(&allocator, [
      ("p/index.ts", "import { Value } from \"./all\";"),
      ("p/all.ts", "export * from \"./values\";"),
      ("p/values.ts", "export const Value = 3;"),
    ])
    .expect("parse");
    assert_eq!(project.symbols().lookup(0, "Value").map(|s| s.file), Some(2));
  }

  #[test]
  fn test_alias_cycle_terminates() {
    let allocator = Allocator::default();
    let project = Project::from_sources(&allocator, [
      ("p/a.ts", "export { X } from \"./b\";\nimport { X as Y } from \"./b\";"),
      ("p/b.ts", "export { X } from \"./a\";"),
    ])
    .expect("parse");
    assert!(project.symbols().lookup(0, "Y").is_none());
  }

  #[test]
  fn test_scan_local_finds_nested_declarations() {
    let allocator = Allocator::default();
    let project = Project::from_sources(&allocator, [(
      "a.ts",
      "function outer() { const hidden = [\"a\"]; return hidden; }",
    )])
    .expect("parse");
    let symbols = project.symbols();
    assert!(symbols.lookup(0, "hidden").is_none());
    assert!(symbols.scan_local(0, "hidden").is_some());
  }

  #[test]
  fn test_declared_type_reads_annotation() {
    let allocator = Allocator::default();
    let source = "const list: Entry[] = [];";
    let project = Project::from_sources(&allocator, [("a.ts", source)])
      .expect("parse");
    let symbol = project.symbols().lookup(0, "list").expect("declared");
    assert_eq!(
      declared_type(project.entry().source, &symbol.declaration),
      Some("Entry[]")
    );
  }
}
