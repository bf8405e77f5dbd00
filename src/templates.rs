//! Template Substitution - Placeholder Colors to Rule Colors
//!
//! A base SVG references nine placeholder colors as `:#RRGG00`, where the
//! red channel encodes the grid row and the green channel the grid column
//! (levels 00, 7f, ff). Each rule yields one recolored copy.

use thiserror::Error;
use tracing::{debug, warn};

use crate::color::ColorHex;
use crate::rules::{Grid, Rule, RuleSet, GRID_SIZE};

/// Marks a color attribute reference inside the SVG text.
pub const COLOR_PREFIX: &str = ":#";

pub const CANONICAL_LEVELS: [u8; GRID_SIZE] = [0, 127, 255];

/// Alpha suffix appended to output file stems.
const ALPHA_SUFFIX: &str = "FF";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("placeholder {token} is shared by grid positions {first:?} and {second:?}")]
    DuplicatePlaceholder {
        token: String,
        first: (usize, usize),
        second: (usize, usize),
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub row: usize,
    pub col: usize,
    /// Six lowercase hex digits, without the prefix.
    pub token: String,
}

/// The nine placeholder tokens, one per grid position.
#[derive(Debug, Clone)]
pub struct PlaceholderTable {
    entries: Vec<Placeholder>,
}

impl PlaceholderTable {
    pub fn canonical() -> Self {
        Self {
            entries: build_entries(CANONICAL_LEVELS),
        }
    }

    /// Build a table from custom channel levels; levels must give distinct tokens.
    pub fn from_levels(levels: [u8; GRID_SIZE]) -> Result<Self, TemplateError> {
        let entries = build_entries(levels);
        for (i, a) in entries.iter().enumerate() {
            if let Some(b) = entries[i + 1..].iter().find(|b| b.token == a.token) {
                return Err(TemplateError::DuplicatePlaceholder {
                    token: a.token.clone(),
                    first: (a.row, a.col),
                    second: (b.row, b.col),
                });
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[Placeholder] {
        &self.entries
    }

    fn lookup(&self, candidate: &str) -> Option<&Placeholder> {
        self.entries.iter().find(|p| p.token == candidate)
    }
}

impl Default for PlaceholderTable {
    fn default() -> Self {
        Self::canonical()
    }
}

fn build_entries(levels: [u8; GRID_SIZE]) -> Vec<Placeholder> {
    let mut entries = Vec::with_capacity(GRID_SIZE * GRID_SIZE);
    for (row, r) in levels.iter().enumerate() {
        for (col, c) in levels.iter().enumerate() {
            entries.push(Placeholder {
                row,
                col,
                token: ColorHex::from([*r, *c, 0]).as_str().to_string(),
            });
        }
    }
    entries
}

/// Base SVG text; never mutated, every rule renders from a fresh copy.
#[derive(Debug, Clone)]
pub struct Template {
    text: String,
    placeholders: PlaceholderTable,
}

#[derive(Debug, Clone)]
pub struct RenderedAsset {
    pub key: ColorHex,
    pub svg: String,
    /// Total substitutions over all placeholders.
    pub replacements: usize,
    /// Substitutions per grid position, row-major.
    pub per_placeholder: [usize; GRID_SIZE * GRID_SIZE],
}

impl RenderedAsset {
    pub fn replacements_at(&self, row: usize, col: usize) -> usize {
        self.per_placeholder[row * GRID_SIZE + col]
    }

    /// `rule-<KEY_UPPER>FF`
    pub fn file_stem(&self) -> String {
        file_stem(&self.key)
    }

    pub fn svg_file_name(&self) -> String {
        format!("{}.svg", self.file_stem())
    }

    pub fn png_file_name(&self) -> String {
        format!("{}.png", self.file_stem())
    }
}

pub fn file_stem(key: &ColorHex) -> String {
    format!("rule-{}{}", key.to_upper(), ALPHA_SUFFIX)
}

impl Template {
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_placeholders(text, PlaceholderTable::canonical())
    }

    pub fn with_placeholders(text: impl Into<String>, placeholders: PlaceholderTable) -> Self {
        Self {
            text: text.into(),
            placeholders,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of placeholder references present in the base text.
    pub fn placeholder_count(&self) -> usize {
        let mut count = 0;
        self.scan(|_, _| count += 1);
        count
    }

    /// Substitute one rule's grid into a copy of the template.
    pub fn render(&self, rule: &Rule) -> RenderedAsset {
        let (svg, per_placeholder) = self.substitute(&rule.grid);
        let replacements: usize = per_placeholder.iter().sum();
        debug!(key = %rule.key, replacements, ?per_placeholder, "rendered template");
        RenderedAsset {
            key: rule.key.clone(),
            svg,
            replacements,
            per_placeholder,
        }
    }

    /// Render every rule, in rule-set order.
    pub fn render_all(&self, rules: &RuleSet) -> Vec<RenderedAsset> {
        if !rules.is_empty() && self.placeholder_count() == 0 {
            warn!("template contains no placeholder colors; outputs will equal the template");
        }
        rules.iter().map(|rule| self.render(rule)).collect()
    }

    /// Single left-to-right pass, so substituted colors are never re-matched.
    fn substitute(&self, grid: &Grid) -> (String, [usize; GRID_SIZE * GRID_SIZE]) {
        let mut out = String::with_capacity(self.text.len());
        let mut last = 0;
        let mut counts = [0usize; GRID_SIZE * GRID_SIZE];
        self.scan(|start, placeholder| {
            out.push_str(&self.text[last..start]);
            out.push_str(COLOR_PREFIX);
            out.push_str(grid.get(placeholder.row, placeholder.col).as_str());
            last = start + COLOR_PREFIX.len() + placeholder.token.len();
            counts[placeholder.row * GRID_SIZE + placeholder.col] += 1;
        });
        out.push_str(&self.text[last..]);
        (out, counts)
    }

    /// Calls `f` with the byte offset of each placeholder reference.
    fn scan<'a>(&'a self, mut f: impl FnMut(usize, &'a Placeholder)) {
        let text = self.text.as_str();
        let mut pos = 0;
        while let Some(found) = text[pos..].find(COLOR_PREFIX) {
            let start = pos + found;
            let token_start = start + COLOR_PREFIX.len();
            let matched = text
                .get(token_start..token_start + 6)
                .and_then(|candidate| self.placeholders.lookup(candidate));
            match matched {
                Some(placeholder) => {
                    f(start, placeholder);
                    pos = token_start + placeholder.token.len();
                }
                None => pos = token_start,
            }
        }
    }
}

/// Render a rule set against raw template text with the canonical placeholders.
pub fn render(template: &str, rules: &RuleSet) -> Vec<RenderedAsset> {
    Template::new(template).render_all(rules)
}
