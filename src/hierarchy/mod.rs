//! Content hierarchy model and builder.
//!
//! Turns the parser's ordered `(kind, text, order)` tuples into a validated
//! [`ContentHierarchy`]. Construction is deliberately lenient: duplicate
//! Title/Meta/H1 elements and orphaned H3 headings are tagged on the nodes
//! rather than rejected, so the checklist can grade them. Only an empty
//! element list or an unrecognized kind tag is a hard error.

mod error;


pub use error::{HierarchyError, HierarchyResult};

use serde::Serialize;
use tracing::debug;

use crate::hashing::normalize_text;

/// Recognized element kinds, in hierarchy order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Title,
    Meta,
    H1,
    H2,
    H3,
}

impl NodeKind {
    /// Parses a parser kind tag, case-insensitively. Returns `None` for
    /// anything outside the fixed five-tag contract.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "title" => Some(Self::Title),
            "meta" => Some(Self::Meta),
            "h1" => Some(Self::H1),
            "h2" => Some(Self::H2),
            "h3" => Some(Self::H3),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Meta => "meta",
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element from the external parser, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawElement {
    pub kind: String,
    pub text: String,
    pub order: u32,
}

impl RawElement {
    pub fn new(kind: impl Into<String>, text: impl Into<String>, order: u32) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
            order,
        }
    }
}

/// A validated hierarchy node.
///
/// `char_length` counts Unicode scalars of the original text, so diacritics
/// count as one character for the length rules. `normalized` is the trimmed,
/// whitespace-collapsed, lowercased form used for keys, duplicate detection,
/// and lexical checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentNode {
    pub kind: NodeKind,
    pub text: String,
    pub normalized: String,
    pub order: u32,
    /// Index of the governing H2 in the node sequence. Only H3 nodes carry a
    /// parent; the index is a lookup relation, never ownership.
    pub parent: Option<usize>,
    /// H3 with no preceding H2 in document order.
    pub orphan: bool,
    /// Extra Title/Meta/H1 beyond the first recognized one.
    pub duplicate: bool,
    pub char_length: usize,
}

impl ContentNode {
    pub fn word_count(&self) -> usize {
        self.normalized.split_whitespace().count()
    }

    /// Question-form heading: the normalized text ends with a question mark.
    pub fn is_question(&self) -> bool {
        self.normalized.ends_with('?')
    }

    /// True when the original text contains letters and none are lowercase.
    pub fn is_all_caps(&self) -> bool {
        let mut has_alpha = false;
        for c in self.text.chars() {
            if c.is_alphabetic() {
                has_alpha = true;
                if c.is_lowercase() {
                    return false;
                }
            }
        }
        has_alpha
    }
}

/// Ordered sequence of validated nodes, owned by a single analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentHierarchy {
    nodes: Vec<ContentNode>,
}

impl ContentHierarchy {
    pub fn nodes(&self) -> &[ContentNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&ContentNode> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The recognized (first, non-duplicate) Title node, if any.
    pub fn title(&self) -> Option<&ContentNode> {
        self.recognized(NodeKind::Title)
    }

    /// The recognized Meta description node, if any.
    pub fn meta(&self) -> Option<&ContentNode> {
        self.recognized(NodeKind::Meta)
    }

    /// The recognized H1 node, if any.
    pub fn h1(&self) -> Option<&ContentNode> {
        self.recognized(NodeKind::H1)
    }

    fn recognized(&self, kind: NodeKind) -> Option<&ContentNode> {
        self.nodes.iter().find(|n| n.kind == kind && !n.duplicate)
    }

    /// Index of the recognized (first, non-duplicate) node of `kind`.
    pub fn recognized_index(&self, kind: NodeKind) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.kind == kind && !n.duplicate)
    }

    /// Count of all nodes of `kind`, duplicates included.
    pub fn count(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|n| n.kind == kind).count()
    }

    pub fn indices_of(&self, kind: NodeKind) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind == kind)
            .map(|(i, _)| i)
            .collect()
    }

    pub fn h2_indices(&self) -> Vec<usize> {
        self.indices_of(NodeKind::H2)
    }

    pub fn h3_indices(&self) -> Vec<usize> {
        self.indices_of(NodeKind::H3)
    }

    /// Indices of H3 nodes attached to the H2 at `h2_index`.
    pub fn children_of(&self, h2_index: usize) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind == NodeKind::H3 && n.parent == Some(h2_index))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn orphan_h3_indices(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind == NodeKind::H3 && n.orphan)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Builds a [`ContentHierarchy`] from parser output.
///
/// Elements are processed in ascending `order` (ties keep input order), so a
/// parser emitting an unordered list still yields a document-order
/// hierarchy. No network or disk I/O happens here.
#[derive(Debug, Default)]
pub struct HierarchyBuilder;

impl HierarchyBuilder {
    pub fn build(elements: &[RawElement]) -> HierarchyResult<ContentHierarchy> {
        if elements.is_empty() {
            return Err(HierarchyError::EmptyInput);
        }

        // Parse every kind tag up front so an unknown tag aborts before any
        // node is tagged.
        let mut parsed: Vec<(NodeKind, &RawElement)> = Vec::with_capacity(elements.len());
        for element in elements {
            let kind =
                NodeKind::parse(&element.kind).ok_or_else(|| HierarchyError::UnknownKind {
                    kind: element.kind.clone(),
                    order: element.order,
                })?;
            parsed.push((kind, element));
        }
        parsed.sort_by_key(|(_, element)| element.order);

        let mut nodes: Vec<ContentNode> = Vec::with_capacity(parsed.len());
        let mut seen_title = false;
        let mut seen_meta = false;
        let mut seen_h1 = false;
        let mut last_h2: Option<usize> = None;

        for (kind, element) in parsed {
            let duplicate = match kind {
                NodeKind::Title => std::mem::replace(&mut seen_title, true),
                NodeKind::Meta => std::mem::replace(&mut seen_meta, true),
                NodeKind::H1 => std::mem::replace(&mut seen_h1, true),
                NodeKind::H2 | NodeKind::H3 => false,
            };
            let (parent, orphan) = match kind {
                NodeKind::H3 => (last_h2, last_h2.is_none()),
                _ => (None, false),
            };

            nodes.push(ContentNode {
                kind,
                text: element.text.clone(),
                normalized: normalize_text(&element.text),
                order: element.order,
                parent,
                orphan,
                duplicate,
                char_length: element.text.chars().count(),
            });

            if kind == NodeKind::H2 {
                last_h2 = Some(nodes.len() - 1);
            }
        }

        debug!(
            nodes = nodes.len(),
            h2 = nodes.iter().filter(|n| n.kind == NodeKind::H2).count(),
            h3 = nodes.iter().filter(|n| n.kind == NodeKind::H3).count(),
            "content hierarchy built"
        );

        Ok(ContentHierarchy { nodes })
    }
}
