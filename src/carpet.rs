//! Carpet Drawing - Iterated Rule Substitution
//!
//! Starts from a single cell of the initial color. Each iteration replaces
//! every cell with the 3x3 grid of the rule keyed by its color, so after
//! `n` iterations the image is `3^n` pixels wide.

use image::{ImageFormat, RgbaImage};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::color::ColorHex;
use crate::rules::{RuleSet, GRID_SIZE};

pub const MAX_ITERATIONS: u32 = 1000;

/// Upper bound on the output pixel count.
pub const MAX_PIXELS: u64 = 1 << 29;

type Rgba = [u8; 4];

#[derive(Debug, Error)]
pub enum CarpetError {
    #[error("at least one rule is required")]
    NoRules,

    #[error("expected 0 <= iterations <= 1000; got {0}")]
    InvalidIterations(u32),

    #[error("{0} iterations exceed the maximum carpet size")]
    TooLarge(u32),

    #[error("expected 8 hexadecimal characters for the initial color; got '{0}'")]
    InvalidColor(String),

    #[error("rule color '{0}' is not a drawable RGB color")]
    Undrawable(ColorHex),

    #[error("color {0} occurs in rules, but no rule matches this color")]
    Uncovered(String),

    #[error("initial color is {0}, please provide a rule for {0}")]
    UncoveredInitial(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Debug, Clone, Default)]
pub struct CarpetConfig {
    pub iterations: u32,
    /// Defaults to the first rule's key, fully opaque.
    pub initial: Option<Rgba>,
}

/// Rules resolved to RGBA, keyed by center color.
pub struct Palette {
    first_key: Rgba,
    rules: HashMap<Rgba, [Rgba; GRID_SIZE * GRID_SIZE]>,
}

impl Palette {
    pub fn from_rules(rules: &RuleSet) -> Result<Self, CarpetError> {
        let mut map = HashMap::new();
        let mut first_key = None;
        for rule in rules.iter() {
            let key = drawable(&rule.key)?;
            let mut cells = [[0u8; 4]; GRID_SIZE * GRID_SIZE];
            for (row, col, color) in rule.grid.iter() {
                cells[row * GRID_SIZE + col] = drawable(color)?;
            }
            first_key.get_or_insert(key);
            map.insert(key, cells);
        }
        let first_key = first_key.ok_or(CarpetError::NoRules)?;
        Ok(Self {
            first_key,
            rules: map,
        })
    }

    /// Distinct colors used anywhere in a rule grid, sorted.
    pub fn grid_colors(&self) -> Vec<Rgba> {
        let mut colors: Vec<Rgba> = self.rules.values().flatten().copied().collect();
        colors.sort_unstable();
        colors.dedup();
        colors
    }

    /// Every grid color and the initial color must have a rule.
    pub fn check_coverage(&self, initial: Rgba) -> Result<(), CarpetError> {
        if let Some(missing) = self
            .grid_colors()
            .into_iter()
            .find(|c| !self.rules.contains_key(c))
        {
            return Err(CarpetError::Uncovered(rgba_repr(missing)));
        }
        if !self.rules.contains_key(&initial) {
            return Err(CarpetError::UncoveredInitial(rgba_repr(initial)));
        }
        Ok(())
    }

    fn lookup(&self, color: Rgba) -> Result<&[Rgba; GRID_SIZE * GRID_SIZE], CarpetError> {
        self.rules
            .get(&color)
            .ok_or_else(|| CarpetError::Uncovered(rgba_repr(color)))
    }
}

fn drawable(color: &ColorHex) -> Result<Rgba, CarpetError> {
    color
        .to_rgba()
        .ok_or_else(|| CarpetError::Undrawable(color.clone()))
}

/// `RRGGBBAA`, uppercase.
pub fn rgba_repr(c: Rgba) -> String {
    format!("{:02X}{:02X}{:02X}{:02X}", c[0], c[1], c[2], c[3])
}

/// Parse `RRGGBBAA`.
pub fn parse_rgba(text: &str) -> Result<Rgba, CarpetError> {
    let invalid = || CarpetError::InvalidColor(text.to_string());
    if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let mut out = [0u8; 4];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&text[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
    }
    Ok(out)
}

fn image_side(iterations: u32) -> Result<u32, CarpetError> {
    if iterations > MAX_ITERATIONS {
        return Err(CarpetError::InvalidIterations(iterations));
    }
    let side = (GRID_SIZE as u32)
        .checked_pow(iterations)
        .ok_or(CarpetError::TooLarge(iterations))?;
    if u64::from(side) * u64::from(side) > MAX_PIXELS {
        return Err(CarpetError::TooLarge(iterations));
    }
    Ok(side)
}

pub fn draw(rules: &RuleSet, config: &CarpetConfig) -> Result<RgbaImage, CarpetError> {
    let side = image_side(config.iterations)?;
    let palette = Palette::from_rules(rules)?;
    info!(rules = rules.len(), "rules found");

    let colors: Vec<String> = palette.grid_colors().into_iter().map(rgba_repr).collect();
    info!(colors = %colors.join(" "), "colors found in rules");

    let initial = config.initial.unwrap_or(palette.first_key);
    palette.check_coverage(initial)?;
    info!(initial = %rgba_repr(initial), "initializing carpet");

    let mut cells = vec![initial];
    let mut width = 1usize;
    for iteration in 1..config.iterations {
        info!(iteration = iteration - 1, "iteration");
        let mut next = alloc_filled(cells.len() * GRID_SIZE * GRID_SIZE, [0u8; 4], config)?;
        expand(&palette, &cells, width, |i, color| next[i] = color)?;
        cells = next;
        width *= GRID_SIZE;
    }

    // The last iteration writes straight into the image buffer.
    let pixels = side as usize * side as usize;
    let mut bytes = alloc_filled(pixels * 4, 0u8, config)?;
    if config.iterations == 0 {
        bytes.copy_from_slice(&initial);
    } else {
        info!(iteration = config.iterations - 1, "iteration");
        expand(&palette, &cells, width, |i, color| {
            bytes[i * 4..i * 4 + 4].copy_from_slice(&color)
        })?;
    }
    RgbaImage::from_raw(side, side, bytes).ok_or(CarpetError::TooLarge(config.iterations))
}

/// Replace each cell of a `width`-wide grid by its rule, passing
/// `(index, color)` for every cell of the grid three times as wide.
fn expand(
    palette: &Palette,
    cells: &[Rgba],
    width: usize,
    mut put: impl FnMut(usize, Rgba),
) -> Result<(), CarpetError> {
    let next_width = width * GRID_SIZE;
    for y in 0..width {
        for x in 0..width {
            let grid = palette.lookup(cells[y * width + x])?;
            for dy in 0..GRID_SIZE {
                for dx in 0..GRID_SIZE {
                    let ny = y * GRID_SIZE + dy;
                    let nx = x * GRID_SIZE + dx;
                    put(ny * next_width + nx, grid[dy * GRID_SIZE + dx]);
                }
            }
        }
    }
    Ok(())
}

/// Fallible allocation; a buffer that cannot be reserved is reported as too large.
fn alloc_filled<T: Clone>(len: usize, value: T, config: &CarpetConfig) -> Result<Vec<T>, CarpetError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| CarpetError::TooLarge(config.iterations))?;
    buf.resize(len, value);
    Ok(buf)
}

pub fn draw_to_file(rules: &RuleSet, config: &CarpetConfig, path: &Path) -> Result<(), CarpetError> {
    let img = draw(rules, config)?;
    img.save_with_format(path, ImageFormat::Png)?;
    info!(path = %path.display(), "wrote carpet");
    Ok(())
}
