// Font loading and embedding for the certificate overlay.
// The name is shown through a Type0 font with the Identity-H encoding: every
// character is written as the two-byte id of its glyph, so anything the font
// covers can be drawn.
use std::collections::BTreeMap;

use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use ttf_parser::{name_id, Face, GlyphId};

use super::RenderError;

const REPLACEMENT: char = '?';
const FALLBACK_NAME: &str = "CertificateFont";
/// `beginbfchar` blocks may hold at most 100 mappings.
const CMAP_CHUNK: usize = 100;

const TO_UNICODE_HEADER: &str = "/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
";

const TO_UNICODE_FOOTER: &str = "endcmap
CMapName currentdict /CMap defineresource pop
end
end
";

/// Anything that can tell how wide a string is at a given point size.
pub trait TextMeasure {
    fn text_width(&self, text: &str, size: f32) -> f32;
}

/// A TrueType/OpenType font borrowed from its file contents. Widths are
/// reported in the 1000-unit glyph space PDF expects.
pub struct CertificateFont<'a> {
    data: &'a [u8],
    face: Face<'a>,
    postscript_name: String,
    scale: f32,
}

impl<'a> CertificateFont<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, RenderError> {
        let face = Face::parse(data, 0).map_err(|e| RenderError::Font(e.to_string()))?;
        let scale = 1000.0 / f32::from(face.units_per_em());

        let postscript_name = face
            .names()
            .into_iter()
            .filter(|n| n.name_id == name_id::POST_SCRIPT_NAME)
            .find_map(|n| n.to_string())
            .map(|n| n.chars().filter(|c| c.is_ascii_graphic()).collect::<String>())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| FALLBACK_NAME.to_string());

        Ok(Self {
            data,
            face,
            postscript_name,
            scale,
        })
    }

    pub fn postscript_name(&self) -> &str {
        &self.postscript_name
    }

    /// Whether the outlines are CFF (an `OTTO` font) rather than TrueType.
    pub fn is_cff(&self) -> bool {
        self.face.tables().cff.is_some()
    }

    /// Characters in `text` this font has no glyph for.
    pub fn missing_chars(&self, text: &str) -> Vec<char> {
        text.chars()
            .filter(|ch| self.face.glyph_index(*ch).is_none())
            .collect()
    }

    /// Glyph drawn for `ch` and the character it actually depicts. Only a
    /// character the font lacks is replaced, by `?` or failing that `.notdef`.
    fn glyph(&self, ch: char) -> (GlyphId, Option<char>) {
        if let Some(glyph) = self.face.glyph_index(ch) {
            return (glyph, Some(ch));
        }
        match self.face.glyph_index(REPLACEMENT) {
            Some(glyph) => (glyph, Some(REPLACEMENT)),
            None => (GlyphId(0), None),
        }
    }

    fn glyph_width(&self, glyph: GlyphId) -> f32 {
        f32::from(self.face.glyph_hor_advance(glyph).unwrap_or(0)) * self.scale
    }

    /// Glyph ids for `text` as big-endian pairs, ready for an Identity-H `Tj`.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        text.chars()
            .flat_map(|ch| self.glyph(ch).0 .0.to_be_bytes())
            .collect()
    }

    /// Embed the font program as a Type0 font whose widths and ToUnicode map
    /// cover the glyphs `text` uses. Returns the id of the Type0 dictionary.
    pub fn embed(&self, doc: &mut Document, text: &str) -> ObjectId {
        let mut used: BTreeMap<u16, Option<char>> = BTreeMap::new();
        for ch in text.chars() {
            let (glyph, shown) = self.glyph(ch);
            used.entry(glyph.0).or_insert(shown);
        }

        let cff = self.is_cff();
        let program = self.data.to_vec();
        let (file_key, file_stream) = if cff {
            (
                "FontFile3",
                Stream::new(dictionary! { "Subtype" => "OpenType" }, program),
            )
        } else {
            let length = i64::try_from(program.len()).unwrap_or(i64::MAX);
            (
                "FontFile2",
                Stream::new(dictionary! { "Length1" => length }, program),
            )
        };
        let file_id = doc.add_object(file_stream);
        // FontFile3 /OpenType needs PDF 1.6.
        if cff && doc.version.as_str() < "1.6" {
            doc.version = "1.6".to_string();
        }

        let bbox = self.face.global_bounding_box();
        let ascent = f32::from(self.face.ascender()) * self.scale;
        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => self.base_font(),
            "Flags" => 4,
            "FontBBox" => [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max]
                .iter()
                .map(|v| Object::Real(f32::from(*v) * self.scale))
                .collect::<Vec<_>>(),
            "ItalicAngle" => 0,
            "Ascent" => Object::Real(ascent),
            "Descent" => Object::Real(f32::from(self.face.descender()) * self.scale),
            "CapHeight" => Object::Real(
                self.face
                    .capital_height()
                    .map_or(ascent, |h| f32::from(h) * self.scale),
            ),
            "StemV" => 80,
            file_key => file_id,
        });

        let widths: Vec<Object> = used
            .keys()
            .flat_map(|&glyph| {
                [
                    Object::Integer(i64::from(glyph)),
                    Object::Array(vec![Object::Real(self.glyph_width(GlyphId(glyph)))]),
                ]
            })
            .collect();

        let mut cid_font = dictionary! {
            "Type" => "Font",
            "Subtype" => if cff { "CIDFontType0" } else { "CIDFontType2" },
            "BaseFont" => self.base_font(),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "W" => widths,
        };
        if !cff {
            cid_font.set("CIDToGIDMap", "Identity");
        }
        let cid_font_id = doc.add_object(cid_font);

        let to_unicode_id = doc.add_object(Stream::new(dictionary! {}, to_unicode_cmap(&used)));

        let type0_name = if cff {
            format!("{}-Identity-H", self.postscript_name)
        } else {
            self.postscript_name.clone()
        };
        doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => Object::Name(type0_name.into_bytes()),
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(cid_font_id)],
            "ToUnicode" => to_unicode_id,
        })
    }

    fn base_font(&self) -> Object {
        Object::Name(self.postscript_name.clone().into_bytes())
    }
}

impl TextMeasure for CertificateFont<'_> {
    fn text_width(&self, text: &str, size: f32) -> f32 {
        let units: f32 = text
            .chars()
            .map(|ch| self.glyph_width(self.glyph(ch).0))
            .sum();
        units * size / 1000.0
    }
}

/// ToUnicode CMap mapping each used glyph id back to its character, so
/// viewers can copy and search the name.
fn to_unicode_cmap(used: &BTreeMap<u16, Option<char>>) -> Vec<u8> {
    let mappings: Vec<(u16, char)> = used
        .iter()
        .filter_map(|(glyph, ch)| ch.map(|ch| (*glyph, ch)))
        .collect();

    let mut cmap = String::from(TO_UNICODE_HEADER);
    for chunk in mappings.chunks(CMAP_CHUNK) {
        cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (glyph, ch) in chunk {
            let mut buf = [0u16; 2];
            let utf16: String = ch
                .encode_utf16(&mut buf)
                .iter()
                .map(|unit| format!("{unit:04X}"))
                .collect();
            cmap.push_str(&format!("<{glyph:04X}> <{utf16}>\n"));
        }
        cmap.push_str("endbfchar\n");
    }
    cmap.push_str(TO_UNICODE_FOOTER);
    cmap.into_bytes()
}
