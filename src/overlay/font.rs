//! Font embedding for overlay text.
//!
//! The font is embedded whole as a Type0 composite font with Identity-H
//! encoding, so text is written as big-endian glyph ids. Only glyphs that
//! were actually drawn get an entry in `/W` and in the ToUnicode CMap.

use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeMap;
use ttf_parser::{name_id, Face, GlyphId};

use super::OverlayError;

const FALLBACK_FONT_NAME: &str = "PdfRenderEmbedded";
const BFCHAR_BLOCK: usize = 100;

#[derive(Debug, Clone, Copy)]
struct GlyphUse {
    /// Advance in 1/1000 text-space units.
    width: u32,
    ch: Option<char>,
}

/// Glyph ids for one line of text plus its advance width.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedText {
    pub glyphs: Vec<u16>,
    /// Total advance in 1/1000 text-space units.
    pub width: u32,
}

impl EncodedText {
    /// Width in points at `font_size`.
    pub fn width_at(&self, font_size: f32) -> f32 {
        self.width as f32 * font_size / 1000.0
    }

    pub fn to_pdf_string(&self) -> Object {
        let bytes = self.glyphs.iter().flat_map(|g| g.to_be_bytes()).collect();
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}

pub struct FontEncoder<'a> {
    data: &'a [u8],
    face: Face<'a>,
    used: BTreeMap<u16, GlyphUse>,
}

impl<'a> FontEncoder<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, OverlayError> {
        let face = Face::parse(data, 0).map_err(|e| OverlayError::Font(e.to_string()))?;
        if face.units_per_em() == 0 {
            return Err(OverlayError::Font("font reports zero units per em".to_string()));
        }
        if face.tables().glyf.is_none() {
            return Err(OverlayError::Font(
                "only TrueType (glyf) outlines can be embedded".to_string(),
            ));
        }
        Ok(Self {
            data,
            face,
            used: BTreeMap::new(),
        })
    }

    fn scale(&self, units: f32) -> f32 {
        units * 1000.0 / self.face.units_per_em() as f32
    }

    fn glyph_width(&self, glyph: GlyphId) -> u32 {
        let advance = self.face.glyph_hor_advance(glyph).unwrap_or(0);
        self.scale(advance as f32).round() as u32
    }

    /// Map a single line of text to glyphs, recording every glyph used.
    pub fn encode(&mut self, text: &str) -> EncodedText {
        let mut glyphs = Vec::with_capacity(text.len());
        let mut width: u32 = 0;

        for ch in text.chars().filter(|c| !c.is_control()) {
            let glyph = self.face.glyph_index(ch).unwrap_or(GlyphId(0));
            let glyph_width = self.glyph_width(glyph);
            let entry = self.used.entry(glyph.0).or_insert(GlyphUse {
                width: glyph_width,
                ch: None,
            });
            if glyph.0 != 0 && entry.ch.is_none() {
                entry.ch = Some(ch);
            }
            glyphs.push(glyph.0);
            width = width.saturating_add(glyph_width);
        }

        EncodedText { glyphs, width }
    }

    pub fn used_glyph_count(&self) -> usize {
        self.used.len()
    }

    fn postscript_name(&self) -> String {
        let name = self
            .face
            .names()
            .into_iter()
            .filter(|n| n.name_id == name_id::POST_SCRIPT_NAME)
            .find_map(|n| n.to_string())
            .unwrap_or_default();

        let cleaned: String = name
            .chars()
            .filter(|c| c.is_ascii_graphic() && !"()<>[]{}/%#".contains(*c))
            .collect();

        if cleaned.is_empty() {
            FALLBACK_FONT_NAME.to_string()
        } else {
            cleaned
        }
    }

    /// `[gid [w] gid [w] ...]` for every glyph drawn.
    fn widths_array(&self) -> Vec<Object> {
        let mut widths = Vec::with_capacity(self.used.len() * 2);
        for (gid, glyph) in &self.used {
            widths.push(Object::Integer(*gid as i64));
            widths.push(Object::Array(vec![Object::Integer(glyph.width as i64)]));
        }
        widths
    }

    fn to_unicode_cmap(&self) -> Vec<u8> {
        let mapped: Vec<(u16, char)> = self
            .used
            .iter()
            .filter_map(|(gid, glyph)| glyph.ch.map(|c| (*gid, c)))
            .collect();

        let mut cmap = String::from(
            "/CIDInit /ProcSet findresource begin\n\
             12 dict begin\n\
             begincmap\n\
             /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
             /CMapName /Adobe-Identity-UCS def\n\
             /CMapType 2 def\n\
             1 begincodespacerange\n\
             <0000> <FFFF>\n\
             endcodespacerange\n",
        );

        for block in mapped.chunks(BFCHAR_BLOCK) {
            cmap.push_str(&format!("{} beginbfchar\n", block.len()));
            for (gid, ch) in block {
                let mut units = [0u16; 2];
                let utf16: String = ch
                    .encode_utf16(&mut units)
                    .iter()
                    .map(|u| format!("{:04X}", u))
                    .collect();
                cmap.push_str(&format!("<{:04X}> <{}>\n", gid, utf16));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str(
            "endcmap\n\
             CMapName currentdict /CMap defineresource pop\n\
             end\n\
             end\n",
        );
        cmap.into_bytes()
    }

    /// Write the font objects into `doc`, storing the Type0 dictionary at `font_id`.
    pub fn write_objects(&self, doc: &mut Document, font_id: ObjectId) {
        let base_font = self.postscript_name();
        let font_file = Stream::new(
            dictionary! { "Length1" => self.data.len() as i64 },
            self.data.to_vec(),
        );
        let font_file_id = doc.add_object(font_file);

        let bbox = self.face.global_bounding_box();
        let ascent = self.scale(self.face.ascender() as f32).round() as i64;
        let descent = self.scale(self.face.descender() as f32).round() as i64;
        let cap_height = self
            .face
            .capital_height()
            .map(|h| self.scale(h as f32).round() as i64)
            .unwrap_or(ascent);

        // Nonsymbolic, plus FixedPitch for monospaced faces.
        let mut flags: i64 = 1 << 5;
        if self.face.is_monospaced() {
            flags |= 1;
        }

        let mut descriptor = dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => Object::Name(base_font.clone().into_bytes()),
            "Flags" => flags,
            "FontBBox" => vec![
                Object::Integer(self.scale(bbox.x_min as f32).round() as i64),
                Object::Integer(self.scale(bbox.y_min as f32).round() as i64),
                Object::Integer(self.scale(bbox.x_max as f32).round() as i64),
                Object::Integer(self.scale(bbox.y_max as f32).round() as i64),
            ],
            "ItalicAngle" => Object::Real(self.face.italic_angle().into()),
            "Ascent" => ascent,
            "Descent" => descent,
            "CapHeight" => cap_height,
            "StemV" => 80i64,
        };
        descriptor.set("FontFile2", font_file_id);
        let descriptor_id = doc.add_object(descriptor);

        let cid_font = dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => Object::Name(base_font.clone().into_bytes()),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0i64,
            },
            "FontDescriptor" => descriptor_id,
            "DW" => self.glyph_width(GlyphId(0)) as i64,
            "W" => self.widths_array(),
            "CIDToGIDMap" => "Identity",
        };
        let cid_font_id = doc.add_object(cid_font);

        let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, self.to_unicode_cmap()));

        let type0 = dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => Object::Name(base_font.into_bytes()),
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(cid_font_id)],
            "ToUnicode" => to_unicode_id,
        };
        doc.objects.insert(font_id, Object::Dictionary(type0));
    }
}
