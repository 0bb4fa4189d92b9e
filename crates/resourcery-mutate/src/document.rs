/// One `use` declaration in the import block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Fully qualified name without the `use` keyword or semicolon.
    pub path: String,
    raw: String,
}

impl Import {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let raw = format!("use {path};");
        Self { path, raw }
    }

    fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        let rest = trimmed.strip_prefix("use ")?;
        let path = rest.strip_suffix(';')?.trim();
        if path.is_empty() {
            return None;
        }
        Some(Self {
            path: path.to_string(),
            raw: line.to_string(),
        })
    }

    fn matches(&self, path: &str) -> bool {
        self.path.trim_start_matches('\\') == path.trim_start_matches('\\')
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ImportLine {
    Use(Import),
    Other(String),
}

impl ImportLine {
    fn raw(&self) -> &str {
        match self {
            ImportLine::Use(import) => &import.raw,
            ImportLine::Other(line) => line,
        }
    }
}

/// A PHP source file split into header, import block and body.
///
/// The header runs up to the first top-level `use` declaration (or through
/// the namespace line when there is none). The body starts after the import
/// block and contains the class declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    header: String,
    imports: Vec<ImportLine>,
    pub(crate) body: String,
    had_imports: bool,
}

const DECLARATION_PREFIXES: &[&str] = &[
    "class ",
    "final class ",
    "abstract class ",
    "readonly class ",
    "interface ",
    "trait ",
    "enum ",
    "return new class",
];

impl SourceDocument {
    pub fn parse(text: &str) -> Self {
        let lines: Vec<&str> = text.split_inclusive('\n').collect();
        let declaration = lines
            .iter()
            .position(|line| {
                let trimmed = line.trim_start();
                DECLARATION_PREFIXES
                    .iter()
                    .any(|prefix| trimmed.starts_with(prefix))
            })
            .unwrap_or(lines.len());

        let use_lines: Vec<usize> = (0..declaration)
            .filter(|&index| Import::parse(lines[index]).is_some())
            .collect();

        match (use_lines.first(), use_lines.last()) {
            (Some(&first), Some(&last)) => {
                let imports = lines[first..=last]
                    .iter()
                    .map(|line| {
                        let line = line.trim_end_matches('\n');
                        match Import::parse(line) {
                            Some(import) => ImportLine::Use(import),
                            None => ImportLine::Other(line.to_string()),
                        }
                    })
                    .collect();
                Self {
                    header: lines[..first].concat(),
                    imports,
                    body: lines[last + 1..].concat(),
                    had_imports: true,
                }
            }
            _ => {
                let split = lines[..declaration]
                    .iter()
                    .position(|line| line.trim_start().starts_with("namespace "))
                    .map(|index| index + 1)
                    .unwrap_or_else(|| lines.len().min(1));
                Self {
                    header: lines[..split].concat(),
                    imports: Vec::new(),
                    body: lines[split..].concat(),
                    had_imports: false,
                }
            }
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.header.len() + self.body.len() + 256);
        out.push_str(&self.header);
        if !self.imports.is_empty() {
            if !self.had_imports {
                out.push('\n');
            }
            for line in &self.imports {
                out.push_str(line.raw());
                out.push('\n');
            }
        }
        out.push_str(&self.body);
        out
    }

    /// Declared imports in file order.
    pub fn imports(&self) -> impl Iterator<Item = &Import> {
        self.imports.iter().filter_map(|line| match line {
            ImportLine::Use(import) => Some(import),
            ImportLine::Other(_) => None,
        })
    }

    pub fn has_import(&self, path: &str) -> bool {
        self.imports().any(|import| import.matches(path))
    }

    /// Add `use {path};` unless already present. New imports go right after
    /// `after` when that import exists, otherwise at the end of the block.
    /// Returns `true` when the document changed.
    pub fn ensure_import(&mut self, path: &str, after: Option<&str>) -> bool {
        if self.has_import(path) {
            return false;
        }

        let position = after
            .and_then(|after| {
                self.imports.iter().position(|line| match line {
                    ImportLine::Use(import) => import.matches(after),
                    ImportLine::Other(_) => false,
                })
            })
            .map(|index| index + 1)
            .unwrap_or_else(|| self.last_use_index().map_or(0, |index| index + 1));

        self.imports
            .insert(position, ImportLine::Use(Import::new(path.trim_start_matches('\\'))));
        true
    }

    fn last_use_index(&self) -> Option<usize> {
        self.imports
            .iter()
            .rposition(|line| matches!(line, ImportLine::Use(_)))
    }

    /// Text following the import block.
    pub fn body(&self) -> &str {
        &self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = "<?php\n\nnamespace App\\Models;\n\nuse Illuminate\\Database\\Eloquent\\Factories\\HasFactory;\nuse Illuminate\\Database\\Eloquent\\Model;\n\nclass Post extends Model\n{\n    use HasFactory;\n}\n";

    #[test]
    fn parse_render_round_trips() {
        let document = SourceDocument::parse(MODEL);
        assert_eq!(document.render(), MODEL);
        assert_eq!(document.imports().count(), 2);
        assert!(document.body().starts_with("\nclass Post"));
    }

    #[test]
    fn trait_use_inside_class_is_not_an_import() {
        let document = SourceDocument::parse(MODEL);
        assert!(!document.has_import("HasFactory"));
        assert!(document.has_import("Illuminate\\Database\\Eloquent\\Factories\\HasFactory"));
    }

    #[test]
    fn imports_are_added_after_namespace_when_missing() {
        let source = "<?php\n\nnamespace App\\Policies;\n\nclass PostPolicy\n{\n}\n";
        let mut document = SourceDocument::parse(source);
        assert!(document.ensure_import("App\\Models\\User", None));
        assert_eq!(
            document.render(),
            "<?php\n\nnamespace App\\Policies;\n\nuse App\\Models\\User;\n\nclass PostPolicy\n{\n}\n"
        );
    }
}
