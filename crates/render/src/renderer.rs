//! The render state machine.
//!
//! `PdfRenderer<New> -> load_font -> add_page -> write_fields -> serialize`.
//! Each step consumes the previous state, so a page cannot be written before
//! a font is chosen and a finished document cannot be written to.

use std::marker::PhantomData;

use cartaporte_documents::CrtDocument;

use crate::font::{FALLBACK_FONT, FIRST_CHAR, FontSource, LAST_CHAR, LoadedFont, encode_win_ansi};
use crate::layout::LayoutTable;
use crate::pdf::{PdfWriter, escape_string, number};
use crate::units::{A4_HEIGHT_PT, A4_WIDTH_PT, to_device};

pub const FONT_SIZE: f64 = 9.0;
const FONT_RESOURCE: &str = "F1";

#[derive(Debug)]
pub struct New;
#[derive(Debug)]
pub struct FontLoaded;
#[derive(Debug)]
pub struct PageAdded;
#[derive(Debug)]
pub struct FieldsWritten;

#[derive(Debug)]
pub struct PdfRenderer<S> {
    font: LoadedFont,
    font_fallback: bool,
    content: Vec<u8>,
    cells: usize,
    _state: PhantomData<S>,
}

/// A finished single-page PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub font_name: String,
    /// True when the configured font could not be embedded.
    pub font_fallback: bool,
    pub cells: usize,
}

impl<S> PdfRenderer<S> {
    fn into_state<T>(self) -> PdfRenderer<T> {
        PdfRenderer {
            font: self.font,
            font_fallback: self.font_fallback,
            content: self.content,
            cells: self.cells,
            _state: PhantomData,
        }
    }
}

impl Default for PdfRenderer<New> {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfRenderer<New> {
    pub fn new() -> Self {
        Self {
            font: LoadedFont::Builtin(FALLBACK_FONT),
            font_fallback: false,
            content: Vec::new(),
            cells: 0,
            _state: PhantomData,
        }
    }

    /// Embed the configured font, or fall back to the built-in one.
    ///
    /// Never fails: a missing or unreadable font only degrades the output.
    pub fn load_font(mut self, source: Option<&FontSource>) -> PdfRenderer<FontLoaded> {
        match source {
            Some(src) => match src.load() {
                Ok(embedded) => {
                    tracing::debug!(font = %embedded.name, "embedded TrueType font");
                    self.font = LoadedFont::Embedded(embedded);
                }
                Err(e) => {
                    tracing::warn!(
                        font = %src.name,
                        error = %e,
                        fallback = FALLBACK_FONT,
                        "font not embedded; using built-in font"
                    );
                    self.font_fallback = true;
                }
            },
            None => tracing::debug!(font = FALLBACK_FONT, "no font configured"),
        }
        self.into_state()
    }
}

impl PdfRenderer<FontLoaded> {
    /// Start the single A4 page.
    pub fn add_page(mut self) -> PdfRenderer<PageAdded> {
        self.content
            .extend_from_slice(format!("BT\n/{FONT_RESOURCE} {} Tf\n", number(FONT_SIZE)).as_bytes());
        self.into_state()
    }
}

impl PdfRenderer<PageAdded> {
    /// Write one text cell per layout entry, in layout order.
    pub fn write_fields(mut self, doc: &CrtDocument, layout: &LayoutTable) -> PdfRenderer<FieldsWritten> {
        for entry in layout.entries() {
            let at = to_device(entry.anchor);
            let text = escape_string(&encode_win_ansi(&entry.cell.text(doc)));
            self.content.extend_from_slice(
                format!("1 0 0 1 {} {} Tm\n(", number(at.x), number(at.y)).as_bytes(),
            );
            self.content.extend_from_slice(&text);
            self.content.extend_from_slice(b") Tj\n");
            self.cells += 1;
        }
        self.content.extend_from_slice(b"ET");
        self.into_state()
    }
}

impl PdfRenderer<FieldsWritten> {
    /// Assemble the document bytes.
    pub fn serialize(self) -> RenderedPdf {
        let mut w = PdfWriter::new();
        let catalog = w.reserve();
        let pages = w.reserve();
        let page = w.reserve();
        let contents = w.stream("", &self.content);
        let font = write_font(&mut w, &self.font);

        w.write_object(
            catalog,
            format!("<< /Type /Catalog /Pages {pages} 0 R >>").as_bytes(),
        );
        w.write_object(
            pages,
            format!("<< /Type /Pages /Kids [{page} 0 R] /Count 1 >>").as_bytes(),
        );
        w.write_object(
            page,
            format!(
                "<< /Type /Page /Parent {pages} 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /Font << /{FONT_RESOURCE} {font} 0 R >> >> /Contents {contents} 0 R >>",
                number(A4_WIDTH_PT),
                number(A4_HEIGHT_PT),
            )
            .as_bytes(),
        );

        RenderedPdf {
            bytes: w.finish(catalog),
            font_name: self.font.base_name().to_string(),
            font_fallback: self.font_fallback,
            cells: self.cells,
        }
    }
}

fn write_font(w: &mut PdfWriter, font: &LoadedFont) -> u32 {
    match font {
        LoadedFont::Builtin(name) => w.object(
            format!("<< /Type /Font /Subtype /Type1 /BaseFont /{name} /Encoding /WinAnsiEncoding >>")
                .as_bytes(),
        ),
        LoadedFont::Embedded(f) => {
            let file = w.stream(&format!(" /Length1 {}", f.program.len()), &f.program);
            let [x0, y0, x1, y1] = f.bbox;
            let descriptor = w.object(
                format!(
                    "<< /Type /FontDescriptor /FontName /{} /Flags 32 /FontBBox [{x0} {y0} {x1} {y1}] \
                     /ItalicAngle 0 /Ascent {} /Descent {} /CapHeight {} /StemV 80 /FontFile2 {file} 0 R >>",
                    f.name, f.ascent, f.descent, f.cap_height
                )
                .as_bytes(),
            );
            let widths = f
                .widths
                .iter()
                .map(|w| w.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            w.object(
                format!(
                    "<< /Type /Font /Subtype /TrueType /BaseFont /{} /FirstChar {FIRST_CHAR} \
                     /LastChar {LAST_CHAR} /Widths [{widths}] /FontDescriptor {descriptor} 0 R \
                     /Encoding /WinAnsiEncoding >>",
                    f.name
                )
                .as_bytes(),
            )
        }
    }
}

/// Render one document onto the layout.
pub fn render(doc: &CrtDocument, layout: &LayoutTable, font: Option<&FontSource>) -> RenderedPdf {
    PdfRenderer::new()
        .load_font(font)
        .add_page()
        .write_fields(doc, layout)
        .serialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartaporte_documents::{PartyRole, RawCrtRow, resolve};

    fn sample() -> CrtDocument {
        let row = RawCrtRow::new(7)
            .with("numero_crt", "PY000000042")
            .with("transportadora", "Transportes (Sur)")
            .with("remitente_nombre", "Exportadora Ñandutí")
            .with("peso_bruto", "1200.50")
            .with("observaciones", "Frágil → no apilar");
        resolve(row)
    }

    fn contains(hay: &[u8], needle: &[u8]) -> bool {
        hay.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn rendering_is_byte_identical() {
        let layout = LayoutTable::standard().unwrap();
        let doc = sample();
        assert_eq!(render(&doc, &layout, None).bytes, render(&doc, &layout, None).bytes);
    }

    #[test]
    fn writes_one_cell_per_layout_entry_on_one_page() {
        let layout = LayoutTable::standard().unwrap();
        let pdf = render(&sample(), &layout, None);
        assert_eq!(pdf.cells, layout.len());
        assert!(pdf.bytes.starts_with(b"%PDF-1.4"));
        assert!(contains(&pdf.bytes, b"/Count 1"));
        assert!(contains(&pdf.bytes, b"/MediaBox [0 0 595.28 841.89]"));
        let tj = pdf.bytes.windows(3).filter(|w| w == b"Tj\n").count();
        assert_eq!(tj, layout.len());
    }

    #[test]
    fn missing_font_falls_back_to_helvetica() {
        let layout = LayoutTable::standard().unwrap();
        let src = FontSource::new("Arial", "/nonexistent/arial.ttf");
        let pdf = render(&sample(), &layout, Some(&src));
        assert!(pdf.font_fallback);
        assert_eq!(pdf.font_name, "Helvetica");
        assert!(contains(&pdf.bytes, b"/BaseFont /Helvetica"));
    }

    #[test]
    fn text_is_placed_at_transformed_anchors() {
        let layout = LayoutTable::standard().unwrap();
        let entry = layout.get("numero_crt").unwrap();
        let at = to_device(entry.anchor);
        let pdf = render(&sample(), &layout, None);
        let expected = format!("1 0 0 1 {} {} Tm\n(PY000000042) Tj", number(at.x), number(at.y));
        assert!(contains(&pdf.bytes, expected.as_bytes()));
    }

    #[test]
    fn text_is_escaped_and_win_ansi_encoded() {
        let layout = LayoutTable::standard().unwrap();
        let doc = sample();
        assert_eq!(doc.parties.get(PartyRole::Carrier).name, "Transportes (Sur)");
        let pdf = render(&doc, &layout, None);
        assert!(contains(&pdf.bytes, b"Transportes \\(Sur\\)"));
        assert!(contains(&pdf.bytes, b"Exportadora \xD1andut\xED"));
        assert!(contains(&pdf.bytes, b"Fr\xE1gil ? no apilar"));
    }

    #[test]
    fn empty_document_still_renders_every_cell() {
        let layout = LayoutTable::standard().unwrap();
        let pdf = render(&CrtDocument::default(), &layout, None);
        assert_eq!(pdf.cells, layout.len());
        assert!(!pdf.font_fallback);
    }
}
