//! Compilation-unit bootstrap.
//!
//! A [`Project`] owns the parsed files of one plugin (its entry file plus the
//! modules it imports, transitively, up to a depth bound) and the
//! [`SymbolTable`] built over them. Every AST node lives in the caller's
//! [`Allocator`], so the whole project shares the allocator's lifetime and
//! can hand out `&'a` references freely.
use std::{
  collections::{HashMap, VecDeque},
  fs,
  path::{Component, Path, PathBuf},
};

use log::debug;
use oxc_allocator::Allocator;
use oxc_ast::ast::{Program, Statement};
use oxc_parser::Parser;
use oxc_span::SourceType;

use crate::{error::ProjectError, symbols::SymbolTable};

/// Index of a file inside its [`Project`].
pub type FileId = usize;

/// Extensions tried, in order, when resolving an import specifier.
const CANDIDATE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];

/// One parsed source file.
#[derive(Debug)]
pub struct SourceFile<'a> {
  pub path:    PathBuf,
  pub source:  &'a str,
  pub program: &'a Program<'a>,
}

/// Options controlling how far [`Project::load`] follows imports.
#[derive(Debug, Clone)]
pub struct LoadOptions {
  /// How many import hops away from the entry file are still loaded.
  pub max_import_depth: usize,
  /// Non-relative specifier prefixes mapped to directories, e.g.
  /// `@utils` → `<source>/src/utils`.
  pub path_aliases:     Vec<(String, PathBuf)>,
}

impl Default for LoadOptions {
  fn default() -> Self {
    Self {
      max_import_depth: 3,
      path_aliases:     Vec::new(),
    }
  }
}

/// Parsed files plus their symbol table.
#[derive(Debug)]
pub struct Project<'a> {
  files:   Vec<SourceFile<'a>>,
  symbols: SymbolTable<'a>,
}

impl<'a> Project<'a> {
  /// Load `entry` and everything it imports (within `options`' bounds).
  ///
  /// # Errors
  ///
  /// Returns an error if the entry file cannot be read or parsed. Imported
  /// files that fail are skipped; their symbols simply stay unresolved.
  pub fn load(
    allocator: &'a Allocator,
    entry: &Path,
    options: &LoadOptions,
  ) -> Result<Self, ProjectError> {
    let text = read_source(entry)?;
    let entry_file = parse_file(allocator, entry, &text)?;

    let mut files = vec![entry_file];
    let mut by_path: HashMap<PathBuf, FileId> = HashMap::new();
    by_path.insert(normalize(entry), 0);
    let mut modules: HashMap<(FileId, String), FileId> = HashMap::new();

    let mut queue = VecDeque::from([(0_usize, 0_usize)]);
    while let Some((file_id, depth)) = queue.pop_front() {
      let specifiers = import_specifiers(files[file_id].program);
      let importer = files[file_id].path.clone();

      for specifier in specifiers {
        let Some(target) = resolve_specifier(&importer, specifier, options)
        else {
          debug!(
            "nixplug-extract: leaving `{specifier}` unresolved in `{}`",
            importer.display()
          );
          continue;
        };

        let key = normalize(&target);
        if let Some(&existing) = by_path.get(&key) {
          modules.insert((file_id, specifier.to_string()), existing);
          continue;
        }

        if depth >= options.max_import_depth {
          continue;
        }

        let parsed = read_source(&target)
          .and_then(|text| parse_file(allocator, &target, &text));
        match parsed {
          Ok(file) => {
            let id = files.len();
            files.push(file);
            by_path.insert(key, id);
            modules.insert((file_id, specifier.to_string()), id);
            queue.push_back((id, depth + 1));
          },
          Err(e) => {
            debug!("nixplug-extract: skipping import: {e}");
          },
        }
      }
    }

    let symbols = SymbolTable::build(&files, modules);
    Ok(Self { files, symbols })
  }

  /// Build a project from in-memory sources. The first source is the entry
  /// file. Relative imports between the given paths are wired up lexically,
  /// nothing is read from disk.
  ///
  /// # Errors
  ///
  /// Returns an error if any source cannot be parsed.
  pub fn from_sources<P, I>(
    allocator: &'a Allocator,
    sources: I,
  ) -> Result<Self, ProjectError>
  where
    P: Into<PathBuf>,
    I: IntoIterator<Item = (P, &'a str)>,
  {
    let mut files = Vec::new();
    for (path, text) in sources {
      let path = path.into();
      files.push(parse_file(allocator, &path, text)?);
    }

    let by_path: HashMap<PathBuf, FileId> = files
      .iter()
      .enumerate()
      .map(|(id, f)| (normalize(&f.path), id))
      .collect();

    let mut modules = HashMap::new();
    for (id, file) in files.iter().enumerate() {
      for specifier in import_specifiers(file.program) {
        let hit = candidate_paths(&relative_base(&file.path, specifier))
          .into_iter()
          .find_map(|candidate| by_path.get(&normalize(&candidate)).copied());
        if let Some(target) = hit {
          modules.insert((id, specifier.to_string()), target);
        }
      }
    }

    let symbols = SymbolTable::build(&files, modules);
    Ok(Self { files, symbols })
  }

  /// The entry file (always present).
  #[must_use]
  pub fn entry(&self) -> &SourceFile<'a> {
    &self.files[0]
  }

  #[must_use]
  pub fn file(&self, id: FileId) -> &SourceFile<'a> {
    &self.files[id]
  }

  #[must_use]
  pub fn files(&self) -> &[SourceFile<'a>] {
    &self.files
  }

  #[must_use]
  pub const fn symbols(&self) -> &SymbolTable<'a> {
    &self.symbols
  }
}

fn read_source(path: &Path) -> Result<String, ProjectError> {
  fs::read_to_string(path).map_err(|source| {
    ProjectError::ReadFile {
      path: path.to_path_buf(),
      source,
    }
  })
}

fn parse_file<'a>(
  allocator: &'a Allocator,
  path: &Path,
  text: &str,
) -> Result<SourceFile<'a>, ProjectError> {
  let source_type = SourceType::from_path(path).map_err(|_| {
    ProjectError::UnsupportedFile {
      path: path.to_path_buf(),
    }
  })?;

  let source: &'a str = allocator.alloc_str(text);
  let ret = Parser::new(allocator, source, source_type).parse();

  if ret.panicked {
    let message = ret
      .errors
      .first()
      .map_or_else(|| "unrecoverable syntax error".to_string(), ToString::to_string);
    return Err(ProjectError::Parse {
      path: path.to_path_buf(),
      message,
    });
  }

  for err in &ret.errors {
    debug!("nixplug-extract: recovered parse error in `{}`: {err}", path.display());
  }

  let program: &'a Program<'a> = allocator.alloc(ret.program);
  Ok(SourceFile {
    path: path.to_path_buf(),
    source,
    program,
  })
}

/// Every module specifier a file imports from or re-exports.
fn import_specifiers<'a>(program: &'a Program<'a>) -> Vec<&'a str> {
  program
    .body
    .iter()
    .filter_map(|stmt| {
      match stmt {
        Statement::ImportDeclaration(decl) => Some(decl.source.value.as_str()),
        Statement::ExportNamedDeclaration(decl) => {
          decl.source.as_ref().map(|s| s.value.as_str())
        },
        Statement::ExportAllDeclaration(decl) => Some(decl.source.value.as_str()),
        _ => None,
      }
    })
    .collect()
}

fn is_relative(specifier: &str) -> bool {
  specifier.starts_with("./") || specifier.starts_with("../")
}

fn relative_base(importer: &Path, specifier: &str) -> PathBuf {
  importer
    .parent()
    .map_or_else(|| PathBuf::from(specifier), |dir| dir.join(specifier))
}

/// `foo` → `foo`, `foo.ts`, `foo.tsx`, ..., `foo/index.ts`, ...
fn candidate_paths(base: &Path) -> Vec<PathBuf> {
  let mut out = vec![base.to_path_buf()];
  for ext in CANDIDATE_EXTENSIONS {
    let mut with_ext = base.as_os_str().to_owned();
    with_ext.push(".");
    with_ext.push(ext);
    out.push(PathBuf::from(with_ext));
  }
  for ext in CANDIDATE_EXTENSIONS {
    out.push(base.join(format!("index.{ext}")));
  }
  out
}

fn resolve_specifier(
  importer: &Path,
  specifier: &str,
  options: &LoadOptions,
) -> Option<PathBuf> {
  let base = if is_relative(specifier) {
    relative_base(importer, specifier)
  } else {
    let (prefix, dir) = options.path_aliases.iter().find(|(prefix, _)| {
      specifier == prefix
        || specifier
          .strip_prefix(prefix.as_str())
          .is_some_and(|rest| rest.starts_with('/'))
    })?;
    let rest = specifier[prefix.len()..].trim_start_matches('/');
    if rest.is_empty() {
      dir.clone()
    } else {
      dir.join(rest)
    }
  };

  candidate_paths(&base).into_iter().find(|p| p.is_file())
}

/// Lexically normalize `.` and `..` components.
pub(crate) fn normalize(path: &Path) -> PathBuf {
  let mut out = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {},
      Component::ParentDir => {
        if !out.pop() {
          out.push("..");
        }
      },
      other => out.push(other.as_os_str()),
    }
  }
  out
}
