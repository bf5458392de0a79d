//! Font loading for the renderer.
//!
//! A configured TrueType file is embedded when it can be read and parsed;
//! otherwise the caller falls back to a standard built-in font.

use std::path::PathBuf;

use thiserror::Error;

/// Built-in PDF font used when embedding fails.
pub const FALLBACK_FONT: &str = "Helvetica";
/// First and last WinAnsi codes covered by the embedded width table.
pub const FIRST_CHAR: u8 = 32;
pub const LAST_CHAR: u8 = 255;

/// Where to find the font to embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSource {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Error)]
pub enum FontError {
    #[error("cannot read font file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse font file {path}: {reason}")]
    Parse { path: String, reason: String },
}

/// A TrueType program ready to embed, with metrics in 1/1000 em.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedFont {
    pub name: String,
    pub program: Vec<u8>,
    /// Advance widths for codes `FIRST_CHAR..=LAST_CHAR`.
    pub widths: Vec<i32>,
    pub ascent: i32,
    pub descent: i32,
    pub cap_height: i32,
    pub bbox: [i32; 4],
}

/// The font a render actually uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedFont {
    Builtin(&'static str),
    Embedded(EmbeddedFont),
}

impl LoadedFont {
    pub fn base_name(&self) -> &str {
        match self {
            LoadedFont::Builtin(name) => name,
            LoadedFont::Embedded(font) => &font.name,
        }
    }
}

impl FontSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Read and parse the font file.
    pub fn load(&self) -> Result<EmbeddedFont, FontError> {
        let path = self.path.display().to_string();
        let program = std::fs::read(&self.path).map_err(|source| FontError::Io {
            path: path.clone(),
            source,
        })?;

        let face = ttf_parser::Face::parse(&program, 0).map_err(|e| FontError::Parse {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let upem = i32::from(face.units_per_em().max(1));
        let scale = |v: i32| v * 1000 / upem;

        let widths = (FIRST_CHAR..=LAST_CHAR)
            .map(|code| {
                decode_win_ansi(code)
                    .and_then(|c| face.glyph_index(c))
                    .and_then(|g| face.glyph_hor_advance(g))
                    .map(|w| scale(i32::from(w)))
                    .unwrap_or(0)
            })
            .collect();

        let bbox = face.global_bounding_box();
        let ascent = scale(i32::from(face.ascender()));
        let embedded = EmbeddedFont {
            name: pdf_name(&self.name),
            widths,
            ascent,
            descent: scale(i32::from(face.descender())),
            cap_height: face
                .capital_height()
                .map(|h| scale(i32::from(h)))
                .unwrap_or(ascent),
            bbox: [
                scale(i32::from(bbox.x_min)),
                scale(i32::from(bbox.y_min)),
                scale(i32::from(bbox.x_max)),
                scale(i32::from(bbox.y_max)),
            ],
            program,
        };
        Ok(embedded)
    }
}

/// Keep only characters valid in a bare PDF name.
fn pdf_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    if cleaned.is_empty() {
        "EmbeddedFont".to_string()
    } else {
        cleaned
    }
}

fn decode_win_ansi(code: u8) -> Option<char> {
    let bytes = [code];
    let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(&bytes);
    text.chars().next()
}

/// Encode text as WinAnsi (Windows-1252); unmappable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for c in text.chars() {
        if c.is_ascii() {
            out.push(c as u8);
            continue;
        }
        let (bytes, _, had_errors) = encoding_rs::WINDOWS_1252.encode(c.encode_utf8(&mut buf));
        match bytes.as_ref() {
            [b] if !had_errors => out.push(*b),
            _ => out.push(b'?'),
        }
    }
    out
}
