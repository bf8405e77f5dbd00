//! Rule Parsing - Line-Oriented Rule Tables
//!
//! Format: `<key> -> <a> <b> <c>, <d> <e> <f>, <g> <h> <i>`
//! Lines without `->` are ignored.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::{encode, CellState, ColorHex};

pub const GRID_SIZE: usize = 3;

const SEPARATOR: &str = "->";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleParseError {
    #[error("line {line}: invalid rule key '{token}'")]
    InvalidKey { line: usize, token: String },

    #[error("line {line}: invalid cell state '{token}' at row {row}, column {col}")]
    InvalidCell {
        line: usize,
        row: usize,
        col: usize,
        token: String,
    },
}

/// Fixed 3x3 neighborhood of colors, row-major.
///
/// Cells not given in the rule text keep the level-0 color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    cells: [ColorHex; GRID_SIZE * GRID_SIZE],
}

impl Grid {
    /// Grid with every cell set to `encode(0)`.
    pub fn filled_default() -> Self {
        let base = encode(0);
        Self {
            cells: std::array::from_fn(|_| base.clone()),
        }
    }

    pub fn get(&self, row: usize, col: usize) -> &ColorHex {
        &self.cells[row * GRID_SIZE + col]
    }

    pub fn set(&mut self, row: usize, col: usize, color: ColorHex) {
        self.cells[row * GRID_SIZE + col] = color;
    }

    /// Cells in row-major order with their positions.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &ColorHex)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, c)| (i / GRID_SIZE, i % GRID_SIZE, c))
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::filled_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub key: ColorHex,
    pub grid: Grid,
}

/// Rules keyed by their center color.
///
/// Iterates in first-seen order; a repeated key replaces the earlier grid in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self { rules: vec![] }
    }

    pub fn insert(&mut self, rule: Rule) {
        match self.rules.iter_mut().find(|r| r.key == rule.key) {
            Some(existing) => existing.grid = rule.grid,
            None => self.rules.push(rule),
        }
    }

    pub fn get(&self, key: &ColorHex) -> Option<&Grid> {
        self.rules.iter().find(|r| &r.key == key).map(|r| &r.grid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Parse a whole rule file.
pub fn parse_rules(text: &str) -> Result<RuleSet, RuleParseError> {
    let mut rules = RuleSet::new();
    for (idx, line) in split_lines(text).enumerate() {
        if let Some(rule) = parse_line(idx + 1, line)? {
            rules.insert(rule);
        }
    }
    Ok(rules)
}

/// Line breaks are `\n`, `\r\n`, or a lone `\r`.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .flat_map(|line| line.strip_suffix('\r').unwrap_or(line).split('\r'))
}

/// Parse one line; `Ok(None)` for lines that carry no rule.
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<Rule>, RuleParseError> {
    let Some((key, value)) = line.split_once(SEPARATOR) else {
        return Ok(None);
    };

    let key = key.trim();
    let key_state = parse_state(key).ok_or_else(|| RuleParseError::InvalidKey {
        line: line_no,
        token: key.to_string(),
    })?;

    let mut grid = Grid::filled_default();
    for (row, row_text) in value.trim().split(',').take(GRID_SIZE).enumerate() {
        for (col, token) in row_text.split_whitespace().take(GRID_SIZE).enumerate() {
            let token = token.trim();
            let state = parse_state(token).ok_or_else(|| RuleParseError::InvalidCell {
                line: line_no,
                row,
                col,
                token: token.to_string(),
            })?;
            grid.set(row, col, encode(state));
        }
    }

    Ok(Some(Rule {
        key: encode(key_state),
        grid,
    }))
}

fn parse_state(token: &str) -> Option<CellState> {
    token.parse::<CellState>().ok()
}
