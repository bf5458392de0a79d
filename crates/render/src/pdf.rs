//! Minimal PDF object writer.
//!
//! Produces uncompressed PDF 1.4 with a classic cross-reference table. Output
//! depends only on the objects written, so identical input gives identical
//! bytes.

use std::fmt::Write as _;

pub type ObjectId = u32;

#[derive(Debug)]
pub struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<Option<usize>>,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        let mut buf = Vec::with_capacity(4096);
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    /// Allocate an object number to be written later.
    pub fn reserve(&mut self) -> ObjectId {
        self.offsets.push(None);
        self.offsets.len() as ObjectId
    }

    /// Write the body of a previously reserved object.
    pub fn write_object(&mut self, id: ObjectId, body: &[u8]) {
        let slot = (id as usize) - 1;
        self.offsets[slot] = Some(self.buf.len());
        self.buf.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    /// Reserve and write in one step.
    pub fn object(&mut self, body: &[u8]) -> ObjectId {
        let id = self.reserve();
        self.write_object(id, body);
        id
    }

    /// Write a stream object. `extra` is appended to the stream dictionary.
    pub fn stream(&mut self, extra: &str, data: &[u8]) -> ObjectId {
        let mut body = format!("<< /Length {}{} >>\nstream\n", data.len(), extra).into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.object(&body)
    }

    /// Append the xref table and trailer and return the finished file.
    ///
    /// Reserved objects that were never written are emitted as free entries.
    pub fn finish(mut self, root: ObjectId) -> Vec<u8> {
        let xref_at = self.buf.len();
        let count = self.offsets.len() + 1;
        let mut xref = format!("xref\n0 {count}\n0000000000 65535 f \n");
        for offset in &self.offsets {
            match offset {
                Some(at) => {
                    let _ = write!(xref, "{at:010} 00000 n \n");
                }
                None => xref.push_str("0000000000 65535 f \n"),
            }
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {count} /Root {root} 0 R >>\nstartxref\n{xref_at}\n%%EOF\n"
        );
        self.buf.extend_from_slice(xref.as_bytes());
        self.buf
    }
}

/// Escape already-encoded bytes for a PDF literal string.
pub fn escape_string(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 2);
    for &b in bytes {
        match b {
            b'\\' | b'(' | b')' => {
                out.push(b'\\');
                out.push(b);
            }
            b'\n' => out.extend_from_slice(b"\\n"),
            b'\r' => out.extend_from_slice(b"\\r"),
            _ => out.push(b),
        }
    }
    out
}

/// Format a number for content streams: at most four decimals, no trailing zeros.
pub fn number(v: f64) -> String {
    let s = format!("{v:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}
