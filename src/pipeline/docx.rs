//! Translated document builder on top of `docx-rs`.
//!
//! Body layout, one block per source page:
//!
//! ```text
//! ¶ right-aligned picture of the page
//! ¶ "Translation" paragraph, right-aligned, runs marked right-to-left
//! ¶ page break            (omitted after the last page)
//! ```
//!
//! `docx-rs` has no setter for the run-level `<w:rtl/>` flag, so it is added
//! to `word/document.xml` after the package is built and before it is
//! zipped, for runs in paragraphs carrying [`TRANSLATION_STYLE`].

use docx_rs::{
    AlignmentType, BreakType, Docx, PageMargin, Paragraph, Pic, Run, Style, StyleType,
};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::{Seek, Write};

/// English Metric Units per inch.
pub const EMU_PER_INCH: u64 = 914_400;

/// Tallest picture placed on a US Letter page with 1" margins.
const MAX_IMAGE_HEIGHT_EMU: u64 = 9 * EMU_PER_INCH;

/// Paragraph style id marking translation blocks.
pub const TRANSLATION_STYLE: &str = "Translation";

// US Letter in twips, 1" margins.
const PAGE_WIDTH_TWIPS: u32 = 12_240;
const PAGE_HEIGHT_TWIPS: u32 = 15_840;
const MARGIN_TWIPS: i32 = 1_440;

#[derive(Debug, thiserror::Error)]
pub enum DocxError {
    #[error("document.xml rewrite failed: {0}")]
    Xml(String),

    #[error("packing failed: {0}")]
    Pack(String),
}

/// Accumulates pages, then writes the `.docx` package in one go.
pub struct TranslatedDocument {
    docx: Docx,
    width_emu: u64,
}

impl TranslatedDocument {
    /// Empty Letter-sized document whose pictures are `width_emu` wide.
    pub fn new(width_emu: u64) -> Self {
        let docx = Docx::new()
            .page_size(PAGE_WIDTH_TWIPS, PAGE_HEIGHT_TWIPS)
            .page_margin(
                PageMargin::new()
                    .top(MARGIN_TWIPS)
                    .bottom(MARGIN_TWIPS)
                    .left(MARGIN_TWIPS)
                    .right(MARGIN_TWIPS),
            )
            .add_style(
                Style::new(TRANSLATION_STYLE, StyleType::Paragraph).name(TRANSLATION_STYLE),
            );
        Self { docx, width_emu }
    }

    /// Right-aligned paragraph holding one PNG with its pixel aspect ratio
    /// preserved.
    pub fn add_page_image(mut self, png: &[u8], width_px: u32, height_px: u32) -> Self {
        let (cx, cy) = picture_extent(width_px, height_px, self.width_emu);
        let pic = Pic::new(png).size(emu(cx), emu(cy));
        self.docx = self.docx.add_paragraph(
            Paragraph::new()
                .align(AlignmentType::Right)
                .add_run(Run::new().add_image(pic)),
        );
        self
    }

    /// Translation block. Each line of `text` stays on its own line; an
    /// empty `text` still yields the (empty) block.
    pub fn add_translation(mut self, text: &str) -> Self {
        let mut run = Run::new();
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                run = run.add_break(BreakType::TextWrapping);
            }
            run = run.add_text(xml_safe(line));
        }
        self.docx = self.docx.add_paragraph(
            Paragraph::new()
                .style(TRANSLATION_STYLE)
                .align(AlignmentType::Right)
                .add_run(run),
        );
        self
    }

    pub fn add_page_break(mut self) -> Self {
        self.docx = self
            .docx
            .add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)));
        self
    }

    /// Build the package, mark translation runs right-to-left and zip it
    /// into `out`.
    pub fn write<W: Write + Seek>(self, out: W) -> Result<(), DocxError> {
        let mut xml = self.docx.build();
        xml.document = mark_rtl_runs(&xml.document)?;
        xml.pack(out).map_err(|e| DocxError::Pack(e.to_string()))
    }
}

/// Insert `<w:rtl/>` into the run properties of every run inside a
/// [`TRANSLATION_STYLE`] paragraph, creating `<w:rPr>` where missing.
pub(crate) fn mark_rtl_runs(document: &[u8]) -> Result<Vec<u8>, DocxError> {
    let xml_err = |e: &dyn std::fmt::Display| DocxError::Xml(e.to_string());

    let mut reader = Reader::from_reader(document);
    let mut writer = Writer::new(Vec::with_capacity(document.len() + 64));
    let mut buf = Vec::new();

    let mut in_translation = false;
    let mut run_open = false;
    let mut in_run_props = false;

    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf).map_err(|e| xml_err(&e))?;
        match &event {
            Event::Eof => break,
            Event::Start(e) if e.name().as_ref() == b"w:p" => in_translation = false,
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"w:pStyle" => {
                in_translation = e
                    .try_get_attribute("w:val")
                    .map_err(|e| xml_err(&e))?
                    .is_some_and(|a| a.value.as_ref() == TRANSLATION_STYLE.as_bytes());
            }
            Event::End(e) if in_run_props && e.name().as_ref() == b"w:rPr" => {
                // `w:rtl` sits late in the run property sequence.
                in_run_props = false;
                writer
                    .write_event(Event::Empty(BytesStart::new("w:rtl")))
                    .map_err(|e| xml_err(&e))?;
            }
            _ => {}
        }

        if run_open {
            run_open = false;
            match &event {
                Event::Start(e) if e.name().as_ref() == b"w:rPr" => in_run_props = true,
                Event::Empty(e) if e.name().as_ref() == b"w:rPr" => {
                    write_rtl_properties(&mut writer).map_err(|e| xml_err(&e))?;
                    continue;
                }
                _ => write_rtl_properties(&mut writer).map_err(|e| xml_err(&e))?,
            }
        }

        if let Event::Start(e) = &event {
            run_open = in_translation && e.name().as_ref() == b"w:r";
        }
        writer.write_event(&event).map_err(|e| xml_err(&e))?;
    }
    Ok(writer.into_inner())
}

fn write_rtl_properties(writer: &mut Writer<Vec<u8>>) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new("w:rPr")))?;
    writer.write_event(Event::Empty(BytesStart::new("w:rtl")))?;
    writer.write_event(Event::End(BytesEnd::new("w:rPr")))?;
    Ok(())
}

/// Display size in EMU: `width_emu` wide, scaled down if the page would
/// overflow vertically.
fn picture_extent(width_px: u32, height_px: u32, width_emu: u64) -> (u64, u64) {
    if width_px == 0 || height_px == 0 {
        return (width_emu, width_emu);
    }
    let cy = width_emu * height_px as u64 / width_px as u64;
    if cy <= MAX_IMAGE_HEIGHT_EMU {
        (width_emu, cy)
    } else {
        (
            MAX_IMAGE_HEIGHT_EMU * width_px as u64 / height_px as u64,
            MAX_IMAGE_HEIGHT_EMU,
        )
    }
}

fn emu(v: u64) -> u32 {
    u32::try_from(v).unwrap_or(u32::MAX)
}

/// Drop characters XML 1.0 cannot carry; tabs become spaces.
fn xml_safe(s: &str) -> String {
    s.chars()
        .filter_map(|c| match c {
            '\t' => Some(' '),
            '\r' => None,
            c if (c as u32) < 0x20 => None,
            '\u{FFFE}' | '\u{FFFF}' => None,
            c => Some(c),
        })
        .collect()
}
