#![allow(dead_code)]

use certifier::config::Config;
use certifier::roster::DEFAULT_ROSTER_TTL;
use certifier::{routes, state::AppState};
use lopdf::content::Content;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const ROSTER_CSV: &str = "name,rollno,email,team\n\
John Doe,cs101,john@ex.com,Team Alpha\n\
Jane Smith,CS102,jane.smith@example.com,Team Beta\n\
Łukasz Nowak,CS103,lukasz@example.pl,Team Gamma\n";

/// Generated fixture font with TrueType outlines.
pub fn truetype_font() -> PathBuf {
    fixture("fixture-sans.ttf")
}

/// Same glyph set with CFF outlines, as shipped `.otf` fonts usually have.
pub fn cff_font() -> PathBuf {
    fixture("fixture-sans.otf")
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Single landscape A4 page with a bit of artwork on it.
pub fn template_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        b"0.2 0.3 0.8 rg 20 20 802 555 re S".to_vec(),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {},
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![Object::Reference(page_id)],
        "Count" => 1,
        "MediaBox" => vec![0.into(), 0.into(), 842.into(), 595.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// Text shown with `Tj` on the first page, decoded through the font's
/// ToUnicode map, plus the font size in effect.
pub fn drawn_text(pdf: &[u8]) -> Vec<(String, f32)> {
    let doc = Document::load_mem(pdf).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 1, "certificate should stay single-page");
    let page_id = *pages.values().next().unwrap();
    let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();

    let mut size = 0.0;
    let mut to_unicode = HashMap::new();
    let mut drawn = Vec::new();
    for op in content.operations {
        match op.operator.as_str() {
            "Tf" => {
                let key = op.operands[0].as_name().unwrap();
                to_unicode = unicode_map(&doc, page_id, key);
                size = number(&op.operands[1]);
            }
            "Tj" => {
                let text = op.operands[0]
                    .as_str()
                    .unwrap()
                    .chunks(2)
                    .map(|pair| to_unicode[&u16::from_be_bytes([pair[0], pair[1]])])
                    .collect();
                drawn.push((text, size));
            }
            _ => {}
        }
    }
    drawn
}

/// Dictionary of the page font registered under `key`.
pub fn page_font<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> &'a Dictionary {
    let resources = doc
        .get_dictionary(page_id)
        .unwrap()
        .get(b"Resources")
        .unwrap()
        .as_dict()
        .unwrap();
    let font_ref = resources
        .get(b"Font")
        .unwrap()
        .as_dict()
        .unwrap()
        .get(key)
        .unwrap()
        .as_reference()
        .unwrap();
    doc.get_dictionary(font_ref).unwrap()
}

/// Glyph id to character, read from the `bfchar` entries of a ToUnicode CMap.
fn unicode_map(doc: &Document, page_id: ObjectId, key: &[u8]) -> HashMap<u16, char> {
    let cmap_ref = page_font(doc, page_id, key)
        .get(b"ToUnicode")
        .unwrap()
        .as_reference()
        .unwrap();
    let stream = doc.get_object(cmap_ref).unwrap().as_stream().unwrap();
    let cmap = String::from_utf8(stream.content.clone()).unwrap();

    let mut map = HashMap::new();
    let mut in_bfchar = false;
    for line in cmap.lines() {
        if line.ends_with("beginbfchar") {
            in_bfchar = true;
            continue;
        }
        if line == "endbfchar" {
            in_bfchar = false;
        }
        let Some((glyph, unicode)) = line.split_once("> <").filter(|_| in_bfchar) else {
            continue;
        };
        let glyph = u16::from_str_radix(glyph.trim_start_matches('<'), 16).unwrap();
        let units: Vec<u16> = unicode
            .trim_end_matches('>')
            .as_bytes()
            .chunks(4)
            .map(|hex| u16::from_str_radix(std::str::from_utf8(hex).unwrap(), 16).unwrap())
            .collect();
        let ch = char::decode_utf16(units).next().unwrap().unwrap();
        map.insert(glyph, ch);
    }
    map
}

fn number(obj: &Object) -> f32 {
    match obj {
        Object::Integer(i) => *i as f32,
        Object::Real(r) => *r as f32,
        other => panic!("expected a number, found {other:?}"),
    }
}

pub struct Assets {
    pub dir: TempDir,
    pub config: Config,
}

impl Assets {
    /// Template always present; roster only when given; font only when a
    /// path is supplied.
    pub fn new(roster_csv: Option<&str>, font: Option<&Path>) -> Self {
        let dir = tempfile::tempdir().unwrap();

        let roster_path = dir.path().join("students.csv");
        if let Some(csv) = roster_csv {
            std::fs::write(&roster_path, csv).unwrap();
        }

        let template_path = dir.path().join("certificate-template.pdf");
        std::fs::write(&template_path, template_pdf()).unwrap();

        let font_path = font
            .map(Path::to_path_buf)
            .unwrap_or_else(|| dir.path().join("fonts").join("missing.ttf"));

        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            roster_path,
            template_path,
            font_path,
            roster_ttl: DEFAULT_ROSTER_TTL,
        };
        Self { dir, config }
    }
}

pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    _assets: Assets,
}

impl TestServer {
    pub async fn spawn(assets: Assets) -> Self {
        let state = Arc::new(AppState::from_config(&assets.config));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, routes::router(state)).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::builder().no_proxy().build().unwrap(),
            _assets: assets,
        }
    }

    pub async fn post(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .unwrap()
    }
}
