// Certificate PDF generation
// Stamps the participant's name onto a fixed single-page template.
mod font;

pub use font::{CertificateFont, TextMeasure};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const MAX_FONT_SIZE: f32 = 40.0;
pub const MIN_FONT_SIZE: f32 = 20.0;
/// Share of the page width the name may occupy before it is shrunk.
pub const MAX_NAME_WIDTH_RATIO: f32 = 0.7;
/// Fixed horizontal nudge applied after centering, in points.
pub const NAME_X_OFFSET: f32 = 19.0;
/// Baseline height as a fraction of the page height, measured from the bottom.
pub const NAME_Y_RATIO: f32 = 0.53;

const PRODUCER: &str = concat!("certifier ", env!("CARGO_PKG_VERSION"));
const MAX_TREE_DEPTH: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to read {}: {source}", .path.display())]
    Asset {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid certificate template: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("invalid certificate template: {0}")]
    Template(String),
    #[error("invalid certificate font: {0}")]
    Font(String),
}

/// Title-case each whitespace-separated word using ASCII case rules only.
pub fn format_name(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    let mut formatted = String::with_capacity(word.len());
                    formatted.push(first.to_ascii_uppercase());
                    formatted.push_str(&chars.as_str().to_ascii_lowercase());
                    formatted
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Largest whole point size in `[MIN_FONT_SIZE, MAX_FONT_SIZE]` at which the
/// text fits within 70% of the page width. If nothing fits, the floor is used
/// and the text is allowed to overflow.
pub fn fit_font_size(measure: &impl TextMeasure, text: &str, page_width: f32) -> f32 {
    let max_width = page_width * MAX_NAME_WIDTH_RATIO;
    let mut size = MAX_FONT_SIZE;
    while measure.text_width(text, size) > max_width && size > MIN_FONT_SIZE {
        size -= 1.0;
    }
    size
}

/// Where and how large the name is drawn on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NamePlacement {
    pub font_size: f32,
    pub x: f32,
    pub y: f32,
}

impl NamePlacement {
    pub fn compute(measure: &impl TextMeasure, text: &str, page: PageBox) -> Self {
        let font_size = fit_font_size(measure, text, page.width);
        let text_width = measure.text_width(text, font_size);
        Self {
            font_size,
            x: page.x + (page.width - text_width) / 2.0 + NAME_X_OFFSET,
            y: page.y + page.height * NAME_Y_RATIO,
        }
    }
}

/// Visible page area: lower-left corner plus size, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Loads the template and font from disk on every render, so each
/// certificate is built from a fresh, request-local document.
#[derive(Debug, Clone)]
pub struct CertificateRenderer {
    template_path: PathBuf,
    font_path: PathBuf,
}

impl CertificateRenderer {
    pub fn new(template_path: impl Into<PathBuf>, font_path: impl Into<PathBuf>) -> Self {
        Self {
            template_path: template_path.into(),
            font_path: font_path.into(),
        }
    }

    /// Draw an already formatted name onto the template and serialize the result.
    pub fn render(&self, formatted_name: &str) -> Result<Vec<u8>, RenderError> {
        let template = read_asset(&self.template_path)?;
        let font_program = read_asset(&self.font_path)?;

        let font = CertificateFont::parse(&font_program)?;
        let mut doc = Document::load_mem(&template)?;

        let page_id = doc
            .get_pages()
            .values()
            .next()
            .copied()
            .ok_or_else(|| RenderError::Template("template has no pages".to_string()))?;
        let page = page_box(&doc, page_id)?;
        let placement = NamePlacement::compute(&font, formatted_name, page);
        let missing = font.missing_chars(formatted_name);
        if !missing.is_empty() {
            warn!(
                font = font.postscript_name(),
                ?missing,
                "Font has no glyphs for some characters; drawing '?' instead"
            );
        }
        debug!(
            font = font.postscript_name(),
            size = placement.font_size,
            x = placement.x,
            y = placement.y,
            "Placing name on certificate"
        );

        let font_id = font.embed(&mut doc, formatted_name);
        let font_key = add_font_resource(&mut doc, page_id, font_id)?;
        let overlay = name_overlay(&font_key, font.encode(formatted_name), placement)?;
        append_content(&mut doc, page_id, overlay)?;
        stamp_info(&mut doc);

        let mut out = Vec::new();
        doc.save_to(&mut out)
            .map_err(|e| RenderError::Template(format!("failed to serialize certificate: {e}")))?;
        Ok(out)
    }
}

fn read_asset(path: &Path) -> Result<Vec<u8>, RenderError> {
    std::fs::read(path).map_err(|source| RenderError::Asset {
        path: path.to_path_buf(),
        source,
    })
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object, RenderError> {
    match obj {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// Look up a page attribute, following `Parent` links for inheritable keys.
fn inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Result<Option<&'a Object>, RenderError> {
    let mut node = doc.get_dictionary(page_id)?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = node.get(key) {
            return resolve(doc, value).map(Some);
        }
        match node.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => node = doc.get_dictionary(parent)?,
            Err(_) => return Ok(None),
        }
    }
    Err(RenderError::Template("page tree is too deep".to_string()))
}

fn number(doc: &Document, obj: &Object) -> Result<f32, RenderError> {
    match resolve(doc, obj)? {
        Object::Integer(i) => Ok(*i as f32),
        Object::Real(r) => Ok(*r as f32),
        other => Err(RenderError::Template(format!(
            "expected a number in MediaBox, found {other:?}"
        ))),
    }
}

fn page_box(doc: &Document, page_id: ObjectId) -> Result<PageBox, RenderError> {
    let media_box = inherited(doc, page_id, b"MediaBox")?
        .ok_or_else(|| RenderError::Template("page has no MediaBox".to_string()))?
        .as_array()?;
    let coords = media_box
        .iter()
        .map(|v| number(doc, v))
        .collect::<Result<Vec<_>, _>>()?;
    let [x0, y0, x1, y1] = coords[..] else {
        return Err(RenderError::Template(format!(
            "MediaBox has {} entries, expected 4",
            coords.len()
        )));
    };
    Ok(PageBox {
        x: x0.min(x1),
        y: y0.min(y1),
        width: (x1 - x0).abs(),
        height: (y1 - y0).abs(),
    })
}

/// Register the font in the page's resources under an unused name and return
/// that name. Inherited resources are copied onto the page first.
fn add_font_resource(
    doc: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
) -> Result<String, RenderError> {
    let mut resources = match inherited(doc, page_id, b"Resources")? {
        Some(obj) => obj.as_dict()?.clone(),
        None => Dictionary::new(),
    };
    let mut fonts = match resources.get(b"Font") {
        Ok(obj) => resolve(doc, obj)?.as_dict()?.clone(),
        Err(_) => Dictionary::new(),
    };

    let key = (0..)
        .map(|n| format!("FCert{n}"))
        .find(|k| !fonts.has(k.as_bytes()))
        .unwrap_or_else(|| "FCert".to_string());
    fonts.set(key.clone(), font_id);
    resources.set("Font", fonts);

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Resources", resources);
    Ok(key)
}

/// Content stream drawing `glyphs` (two-byte glyph ids) in black.
fn name_overlay(
    font_key: &str,
    glyphs: Vec<u8>,
    placement: NamePlacement,
) -> Result<Vec<u8>, RenderError> {
    let content = Content {
        operations: vec![
            Operation::new("Q", vec![]),
            Operation::new("q", vec![]),
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(font_key.as_bytes().to_vec()),
                    Object::Real(placement.font_size),
                ],
            ),
            Operation::new("rg", vec![0.into(), 0.into(), 0.into()]),
            Operation::new("Td", vec![Object::Real(placement.x), Object::Real(placement.y)]),
            Operation::new(
                "Tj",
                vec![Object::String(glyphs, StringFormat::Hexadecimal)],
            ),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ],
    };
    let mut bytes = b"\n".to_vec();
    bytes.extend(content.encode()?);
    Ok(bytes)
}

/// Wrap the existing page content in `q`/`Q` and append the overlay after it,
/// so whatever graphics state the template leaves behind cannot leak into
/// the name.
fn append_content(doc: &mut Document, page_id: ObjectId, overlay: Vec<u8>) -> Result<(), RenderError> {
    let existing = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id)? {
            Object::Array(streams) => streams.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(streams)) => streams.clone(),
        _ => Vec::new(),
    };

    let save_id = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
    let overlay_id = doc.add_object(Stream::new(dictionary! {}, overlay));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(save_id));
    contents.extend(existing);
    contents.push(Object::Reference(overlay_id));

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Contents", contents);
    Ok(())
}

fn stamp_info(doc: &mut Document) {
    let mod_date = chrono::Utc::now().format("D:%Y%m%d%H%M%SZ").to_string();

    let info_id = match doc.trailer.get(b"Info").and_then(Object::as_reference) {
        Ok(id) => id,
        Err(_) => {
            let id = doc.add_object(Dictionary::new());
            doc.trailer.set("Info", id);
            id
        }
    };

    if let Ok(Object::Dictionary(info)) = doc.get_object_mut(info_id) {
        info.set("Producer", Object::string_literal(PRODUCER));
        info.set("ModDate", Object::string_literal(mod_date));
    }
}
