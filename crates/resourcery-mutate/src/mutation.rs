use crate::anchor::Anchor;
use crate::block::{matching_brace, next_open_brace};
use crate::document::SourceDocument;
use crate::error::{MutationError, Result};

/// A typed edit against a [`SourceDocument`].
#[derive(Debug, Clone)]
pub enum Mutation {
    /// Add an import unless it is already declared.
    EnsureImport { path: String, after: Option<String> },
    /// Insert `content` right after the anchor.
    InsertAfter { anchor: Anchor, content: String },
    /// Insert `content` right before the anchor.
    InsertBefore { anchor: Anchor, content: String },
    /// Replace the anchor text with `content`.
    Replace { anchor: Anchor, content: String },
    /// Replace everything strictly between two anchors.
    ReplaceBetween {
        start: Anchor,
        end: Anchor,
        content: String,
    },
    /// Replace the inside of the `{ ... }` block opened after the anchor.
    ReplaceBlockBody { opener: Anchor, content: String },
    /// Insert `content` before the line holding the class's closing brace.
    AppendToClass { content: String },
}

/// Whether applying a mutation changed the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Changed,
    Unchanged,
}

impl Mutation {
    pub fn ensure_import(path: impl Into<String>, after: Option<&str>) -> Self {
        Self::EnsureImport {
            path: path.into(),
            after: after.map(str::to_string),
        }
    }

    pub fn insert_after(anchor: Anchor, content: impl Into<String>) -> Self {
        Self::InsertAfter {
            anchor,
            content: content.into(),
        }
    }

    pub fn insert_before(anchor: Anchor, content: impl Into<String>) -> Self {
        Self::InsertBefore {
            anchor,
            content: content.into(),
        }
    }

    pub fn replace(anchor: Anchor, content: impl Into<String>) -> Self {
        Self::Replace {
            anchor,
            content: content.into(),
        }
    }

    pub fn replace_between(start: Anchor, end: Anchor, content: impl Into<String>) -> Self {
        Self::ReplaceBetween {
            start,
            end,
            content: content.into(),
        }
    }

    pub fn replace_block_body(opener: Anchor, content: impl Into<String>) -> Self {
        Self::ReplaceBlockBody {
            opener,
            content: content.into(),
        }
    }

    pub fn append_to_class(content: impl Into<String>) -> Self {
        Self::AppendToClass {
            content: content.into(),
        }
    }

    /// Short description for logs and errors.
    pub fn describe(&self) -> String {
        match self {
            Mutation::EnsureImport { path, .. } => format!("ensure import {path}"),
            Mutation::InsertAfter { anchor, .. } => format!("insert after {anchor}"),
            Mutation::InsertBefore { anchor, .. } => format!("insert before {anchor}"),
            Mutation::Replace { anchor, .. } => format!("replace {anchor}"),
            Mutation::ReplaceBetween { start, end, .. } => {
                format!("replace between {start} and {end}")
            }
            Mutation::ReplaceBlockBody { opener, .. } => format!("replace block after {opener}"),
            Mutation::AppendToClass { .. } => "append to class".to_string(),
        }
    }
}

impl SourceDocument {
    /// Apply one mutation. Import injection is idempotent; every other
    /// mutation fails when its anchor is missing or it changes nothing.
    pub fn apply(&mut self, mutation: &Mutation) -> Result<Applied> {
        if let Mutation::EnsureImport { path, after } = mutation {
            let changed = self.ensure_import(path, after.as_deref());
            tracing::debug!(mutation = %mutation.describe(), changed, "import ensured");
            return Ok(if changed {
                Applied::Changed
            } else {
                Applied::Unchanged
            });
        }

        let rewritten = rewrite_body(&self.body, mutation)?;
        if rewritten == self.body {
            return Err(MutationError::NoOp(mutation.describe()));
        }
        self.body = rewritten;
        tracing::debug!(mutation = %mutation.describe(), "mutation applied");
        Ok(Applied::Changed)
    }

    /// Apply mutations in order, stopping at the first failure.
    pub fn apply_all(&mut self, mutations: &[Mutation]) -> Result<()> {
        for mutation in mutations {
            self.apply(mutation)?;
        }
        Ok(())
    }
}

/// Parse `text`, apply `mutations` and render the result.
pub fn rewrite(text: &str, mutations: &[Mutation]) -> Result<String> {
    let mut document = SourceDocument::parse(text);
    document.apply_all(mutations)?;
    Ok(document.render())
}

fn rewrite_body(body: &str, mutation: &Mutation) -> Result<String> {
    match mutation {
        Mutation::EnsureImport { .. } => Ok(body.to_string()),
        Mutation::InsertAfter { anchor, content } => {
            let range = anchor.locate(body)?;
            Ok(splice(body, range.end, range.end, content))
        }
        Mutation::InsertBefore { anchor, content } => {
            let range = anchor.locate(body)?;
            Ok(splice(body, range.start, range.start, content))
        }
        Mutation::Replace { anchor, content } => {
            let range = anchor.locate(body)?;
            Ok(splice(body, range.start, range.end, content))
        }
        Mutation::ReplaceBetween {
            start,
            end,
            content,
        } => {
            let first = start.locate(body)?;
            let second = end
                .find_from(body, first.end)?
                .ok_or_else(|| MutationError::AnchorNotFound(end.to_string()))?;
            Ok(splice(body, first.end, second.start, content))
        }
        Mutation::ReplaceBlockBody { opener, content } => {
            let range = opener.locate(body)?;
            let open = next_open_brace(body, range.end)
                .ok_or_else(|| MutationError::UnbalancedBlock(opener.to_string()))?;
            let close = matching_brace(body, open)
                .ok_or_else(|| MutationError::UnbalancedBlock(opener.to_string()))?;
            Ok(splice(body, open + 1, close, content))
        }
        Mutation::AppendToClass { content } => {
            let close = body.rfind('}').ok_or(MutationError::ClassCloseNotFound)?;
            let line_start = body[..close].rfind('\n').unwrap_or(close);
            Ok(splice(body, line_start, line_start, content))
        }
    }
}

fn splice(text: &str, start: usize, end: usize, content: &str) -> String {
    let mut out = String::with_capacity(text.len() + content.len());
    out.push_str(&text[..start]);
    out.push_str(content);
    out.push_str(&text[end..]);
    out
}
