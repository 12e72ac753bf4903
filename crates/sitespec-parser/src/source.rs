//! Import resolution and the source map.
//!
//! A site is described by a root `.api` file that may pull in other files
//! with `import "relative/path.api"` lines. [`Source::load`] inlines every
//! import recursively into one text, trimming each line on the way. The
//! resulting text is what the lexer sees; spans point into it.
//!
//! Every kept line remembers where it came from, so [`Source::locate`] can
//! map a span offset back to the originating file and line.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use log::debug;
use winnow::{
    Parser as _,
    ascii::space1,
    combinator::{delimited, preceded},
    token::take_while,
};

use crate::{
    error::{Diagnostic, ErrorCode, ParseError},
    signature::IResult,
};

/// A file and 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    path: PathBuf,
    line: usize,
}

impl Location {
    pub fn new(path: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            path: path.into(),
            line,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn line(&self) -> usize {
        self.line
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}

#[derive(Debug, Clone, Copy)]
struct LineOrigin {
    /// Byte offset of the line in the resolved text.
    offset: usize,
    /// Index into `Source::files`.
    file: usize,
    line: usize,
}

/// Resolved source text together with its source map.
#[derive(Debug, Clone)]
pub struct Source {
    name: String,
    text: String,
    files: Vec<PathBuf>,
    lines: Vec<LineOrigin>,
}

impl Source {
    /// Read `path` and inline its imports recursively.
    ///
    /// Imports are resolved relative to the directory of the importing file.
    /// A file may be imported more than once along different branches; a
    /// file that (transitively) imports itself is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        let path = path.as_ref();
        let mut resolver = Resolver::default();
        resolver.include(path, None)?;

        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!(
            name = name.as_str(),
            files = resolver.files.len(),
            lines = resolver.lines.len();
            "Resolved imports"
        );

        Ok(Self {
            name,
            text: resolver.text,
            files: resolver.files,
            lines: resolver.lines,
        })
    }

    /// Build a source from in-memory text. `import` lines are kept as-is and
    /// reported by the parser, since there is no directory to resolve them in.
    pub fn inline(name: impl Into<String>, text: &str) -> Self {
        let name = name.into();
        let mut resolved = String::with_capacity(text.len());
        let mut lines = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            lines.push(LineOrigin {
                offset: resolved.len(),
                file: 0,
                line: idx + 1,
            });
            resolved.push_str(line.trim());
            resolved.push('\n');
        }

        Self {
            files: vec![PathBuf::from(&name)],
            name,
            text: resolved,
            lines,
        }
    }

    /// The site name: the root file stem, or the name given to [`Source::inline`].
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resolved text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Every file that contributed lines, in first-visit order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Map a byte offset of the resolved text to its originating file and line.
    pub fn locate(&self, offset: usize) -> Option<Location> {
        let idx = self
            .lines
            .partition_point(|origin| origin.offset <= offset)
            .checked_sub(1)?;
        let origin = self.lines[idx];
        Some(Location::new(&self.files[origin.file], origin.line))
    }

    /// Attach a location to a diagnostic from its primary span, unless it
    /// already has one.
    pub fn annotate(&self, diagnostic: Diagnostic) -> Diagnostic {
        if diagnostic.location().is_some() {
            return diagnostic;
        }
        match diagnostic
            .primary_span()
            .and_then(|span| self.locate(span.start()))
        {
            Some(location) => diagnostic.with_location(location),
            None => diagnostic,
        }
    }
}

#[derive(Debug, Default)]
struct Resolver {
    text: String,
    files: Vec<PathBuf>,
    lines: Vec<LineOrigin>,
    /// Canonical paths of the files currently being inlined, outermost first.
    visiting: Vec<PathBuf>,
    /// The same files as written in the import lines.
    chain: Vec<PathBuf>,
}

impl Resolver {
    fn include(&mut self, path: &Path, importer: Option<Location>) -> Result<(), Diagnostic> {
        let canonical =
            fs::canonicalize(path).map_err(|err| self.unreadable(path, importer.clone(), &err))?;

        if self.visiting.contains(&canonical) {
            let mut diagnostic = Diagnostic::error(format!(
                "import cycle: `{}` imports itself",
                path.display()
            ))
            .with_code(ErrorCode::E011)
            .with_help(format!("import chain: {}", self.chain_with(path)));
            if let Some(location) = importer {
                diagnostic = diagnostic.with_location(location);
            }
            return Err(diagnostic);
        }

        let content =
            fs::read_to_string(path).map_err(|err| self.unreadable(path, importer, &err))?;

        let file = self.files.len();
        self.files.push(path.to_path_buf());
        self.visiting.push(canonical);
        self.chain.push(path.to_path_buf());

        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if let Some(target) = import_target(line) {
                let target_path = path.parent().unwrap_or(Path::new("")).join(target);
                debug!(path = target_path.display().to_string(); "Inlining import");
                self.include(&target_path, Some(Location::new(path, idx + 1)))?;
            } else {
                self.lines.push(LineOrigin {
                    offset: self.text.len(),
                    file,
                    line: idx + 1,
                });
                self.text.push_str(line);
                self.text.push('\n');
            }
        }

        self.visiting.pop();
        self.chain.pop();
        Ok(())
    }

    fn unreadable(&self, path: &Path, importer: Option<Location>, err: &io::Error) -> Diagnostic {
        let mut diagnostic = Diagnostic::error(format!("cannot read `{}`: {err}", path.display()))
            .with_code(ErrorCode::E010);
        if let Some(location) = importer {
            diagnostic = diagnostic
                .with_location(location)
                .with_help(format!("import chain: {}", self.chain_with(path)));
        }
        diagnostic
    }

    fn chain_with(&self, last: &Path) -> String {
        self.chain
            .iter()
            .map(PathBuf::as_path)
            .chain([last])
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// The quoted target of an `import "x.api"` line.
fn import_target(line: &str) -> Option<&str> {
    let mut input = line;
    let target = import_line.parse_next(&mut input).ok()?;
    target.ends_with(".api").then_some(target)
}

fn import_line<'a>(input: &mut &'a str) -> IResult<&'a str> {
    preceded(
        ("import", space1),
        delimited('"', take_while(1.., |c: char| c != '"'), '"'),
    )
    .parse_next(input)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_import_target() {
        assert_eq!(import_target(r#"import "types.api""#), Some("types.api"));
        assert_eq!(import_target(r#"import   "a/b.api" // x"#), Some("a/b.api"));
        assert_eq!(import_target(r#"import "types.txt""#), None);
        assert_eq!(import_target(r#"imported "types.api""#), None);
        assert_eq!(import_target("type Foo {"), None);
    }

    #[test]
    fn test_inline_trims_and_maps_lines() {
        let source = Source::inline("site", "  type A {\n\tName string\n}\n");

        assert_eq!(source.text(), "type A {\nName string\n}\n");
        assert_eq!(source.name(), "site");

        let location = source.locate(10).unwrap();
        assert_eq!(location.line(), 2);
        assert_eq!(location.path(), Path::new("site"));
    }

    #[test]
    fn test_load_inlines_imports_in_place() {
        let dir = TempDir::new().unwrap();
        write(&dir, "types/user.api", "type User {\n  Name string\n}\n");
        let root = write(
            &dir,
            "site.api",
            "type A {}\nimport \"types/user.api\"\ntype B {}\n",
        );

        let source = Source::load(&root).unwrap();

        assert_eq!(
            source.text(),
            "type A {}\ntype User {\nName string\n}\ntype B {}\n"
        );
        assert_eq!(source.name(), "site");
        assert_eq!(source.files().len(), 2);

        let offset = source.text().find("Name").unwrap();
        let location = source.locate(offset).unwrap();
        assert!(location.path().ends_with("types/user.api"));
        assert_eq!(location.line(), 2);

        let offset = source.text().find("type B").unwrap();
        assert_eq!(source.locate(offset).unwrap().line(), 3);
    }

    #[test]
    fn test_nested_imports_resolve_relative_to_importer() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a/c.api", "type C {}\n");
        write(&dir, "a/b.api", "import \"c.api\"\n");
        let root = write(&dir, "root.api", "import \"a/b.api\"\n");

        let source = Source::load(&root).unwrap();

        assert_eq!(source.text(), "type C {}\n");
    }

    #[test]
    fn test_diamond_imports_are_allowed() {
        let dir = TempDir::new().unwrap();
        write(&dir, "d.api", "type D {}\n");
        write(&dir, "b.api", "import \"d.api\"\n");
        write(&dir, "c.api", "import \"d.api\"\n");
        let root = write(&dir, "a.api", "import \"b.api\"\nimport \"c.api\"\n");

        let source = Source::load(&root).unwrap();

        assert_eq!(source.text(), "type D {}\ntype D {}\n");
    }

    #[test]
    fn test_import_cycle_is_an_error() {
        let dir = TempDir::new().unwrap();
        write(&dir, "b.api", "import \"a.api\"\n");
        let root = write(&dir, "a.api", "type A {}\nimport \"b.api\"\n");

        let err = Source::load(&root).unwrap_err();
        let diagnostic = &err.diagnostics()[0];

        assert_eq!(diagnostic.code(), Some(ErrorCode::E011));
        assert!(diagnostic.help().unwrap().contains("a.api -> "));
        let location = diagnostic.location().unwrap();
        assert!(location.path().ends_with("b.api"));
        assert_eq!(location.line(), 1);
    }

    #[test]
    fn test_missing_import_is_an_error() {
        let dir = TempDir::new().unwrap();
        let root = write(&dir, "a.api", "\nimport \"missing.api\"\n");

        let err = Source::load(&root).unwrap_err();
        let diagnostic = &err.diagnostics()[0];

        assert_eq!(diagnostic.code(), Some(ErrorCode::E010));
        assert!(diagnostic.message().contains("missing.api"));
        assert_eq!(diagnostic.location().unwrap().line(), 2);
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();

        let err = Source::load(dir.path().join("nope.api")).unwrap_err();

        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E010));
        assert!(err.diagnostics()[0].location().is_none());
    }
}
