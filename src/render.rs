// Document rendering - one PDF per registration
//
// Layout is computed first (DocumentLayout) and drawn second (PdfRenderer),
// so what goes on the page can be checked without reading PDF bytes.

use crate::error::{Error, Result};
use crate::record::Registration;
use chrono::Local;
use printpdf::image_crate::{self, DynamicImage};
use printpdf::*;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

// ============================================================================
// RENDERER TRAIT
// ============================================================================

/// Produces one document per call for a stored registration
pub trait DocumentRenderer: Send + Sync {
    /// Render `record` into `out_dir`, returning the written path
    ///
    /// A missing photo is not an error; the document is rendered without it.
    fn render(&self, record: &Registration, photo: Option<&Path>, out_dir: &Path)
        -> Result<PathBuf>;

    /// File extension of the produced documents, without the dot
    fn extension(&self) -> &str;
}

/// `registration_<identifier>.<ext>`
pub fn document_file_name(id: &str, extension: &str) -> String {
    format!("registration_{id}.{extension}")
}

// ============================================================================
// LAYOUT
// ============================================================================

pub const TITLE: &str = "STUDENT REGISTRATION FORM";

pub const DECLARATION_HEADING: &str = "Declaration:";

pub const DECLARATION: [&str; 2] = [
    "I hereby declare that the information provided above is true to the best of my knowledge.",
    "I understand that any false information may result in cancellation of my admission.",
];

pub const SIGNATURES: [&str; 2] = ["Student Signature", "Guardian Signature"];

/// Characters per line in the details column
const VALUE_WRAP: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub label: &'static str,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout {
    pub institution: String,
    pub logo: Option<PathBuf>,
    pub photo: Option<PathBuf>,
    pub rows: Vec<TableRow>,
}

impl DocumentLayout {
    /// Lay out a record; images are kept only if their files exist
    pub fn for_record(
        record: &Registration,
        institution: &str,
        logo: Option<&Path>,
        photo: Option<&Path>,
    ) -> Self {
        let rows = record
            .display_fields()
            .into_iter()
            .map(|(label, value)| TableRow {
                label,
                lines: wrap_lines(value, VALUE_WRAP),
            })
            .collect();

        DocumentLayout {
            institution: institution.to_string(),
            logo: existing_file(logo),
            photo: existing_file(photo),
            rows,
        }
    }

    pub fn line_count(&self) -> usize {
        self.rows.iter().map(|row| row.lines.len()).sum()
    }
}

fn existing_file(path: Option<&Path>) -> Option<PathBuf> {
    path.filter(|p| p.is_file()).map(Path::to_path_buf)
}

/// Word-wrap text to `width` characters, keeping explicit line breaks
///
/// Always yields at least one line; words longer than `width` are split.
pub fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let rest = word.split_off(width);
                lines.push(word.into_iter().collect());
                word = rest;
            }

            let current_len = current.chars().count();
            if !current.is_empty() && current_len + 1 + word.len() > width {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.extend(word);
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

// ============================================================================
// PDF RENDERER
// ============================================================================

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const BOTTOM_LIMIT: f32 = 25.0;

const LABEL_X: f32 = 20.0;
const VALUE_X: f32 = 70.0;
const TABLE_RIGHT: f32 = 190.0;
const LINE_HEIGHT: f32 = 5.5;
const CELL_PADDING: f32 = 2.0;

type Rgb3 = (f32, f32, f32);

const DARK_GREEN: Rgb3 = (0.0, 0.39, 0.0);
const DARK_BLUE: Rgb3 = (0.0, 0.0, 0.55);
const LIGHT_BLUE: Rgb3 = (0.68, 0.85, 0.90);
const LIGHT_YELLOW: Rgb3 = (1.0, 1.0, 0.88);
const WHITE_SMOKE: Rgb3 = (0.96, 0.96, 0.96);
const RED: Rgb3 = (1.0, 0.0, 0.0);
const GREY: Rgb3 = (0.5, 0.5, 0.5);
const BLACK: Rgb3 = (0.0, 0.0, 0.0);

fn color((r, g, b): Rgb3) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn pdf_error(err: printpdf::Error) -> Error {
    Error::render(err.to_string())
}

/// A4 PDF in the centre's registration-form style
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    institution: String,
    logo: Option<PathBuf>,
}

impl PdfRenderer {
    pub fn new(institution: impl Into<String>, logo: Option<PathBuf>) -> Self {
        Self {
            institution: institution.into(),
            logo,
        }
    }

    pub fn layout(&self, record: &Registration, photo: Option<&Path>) -> DocumentLayout {
        DocumentLayout::for_record(record, &self.institution, self.logo.as_deref(), photo)
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(
        &self,
        record: &Registration,
        photo: Option<&Path>,
        out_dir: &Path,
    ) -> Result<PathBuf> {
        let layout = self.layout(record, photo);

        if photo.is_some() && layout.photo.is_none() {
            warn!(id = %record.id, "photo not found, rendering without it");
        }

        fs::create_dir_all(out_dir).map_err(|source| Error::DirectoryCreate {
            path: out_dir.to_path_buf(),
            source,
        })?;
        let path = out_dir.join(document_file_name(&record.id, self.extension()));

        let mut canvas = Canvas::new(&format!("Registration {}", record.id))?;
        draw_header(&canvas, &layout);
        draw_title(&canvas, &layout);
        canvas.y = 215.0;
        draw_table(&mut canvas, &layout);
        draw_declaration(&mut canvas);
        draw_signatures(&mut canvas);
        draw_footer(&canvas);

        let file = File::create(&path)?;
        canvas
            .doc
            .save(&mut BufWriter::new(file))
            .map_err(pdf_error)?;

        info!(id = %record.id, path = %path.display(), "rendered registration document");
        Ok(path)
    }

    fn extension(&self) -> &str {
        "pdf"
    }
}

struct Canvas {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl Canvas {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Canvas {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
        })
    }

    /// Start a new page if fewer than `needed` mm remain
    fn ensure_space(&mut self, needed: f32) {
        if self.y - needed < BOTTOM_LIMIT {
            let (page, layer) = self
                .doc
                .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
            debug!("document continued on a new page");
        }
    }

    fn text(&self, text: &str, size: f32, x: f32, y: f32, bold: bool, fill: Rgb3) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.set_fill_color(color(fill));
        self.layer.use_text(text, size, Mm(x), Mm(y), font);
    }

    fn fill_rect(&self, x1: f32, y1: f32, x2: f32, y2: f32, fill: Rgb3) {
        self.layer.set_fill_color(color(fill));
        self.layer.add_rect(Rect::new(Mm(x1), Mm(y1), Mm(x2), Mm(y2)));
    }

    fn line(&self, x1: f32, y1: f32, x2: f32, y2: f32, stroke: Rgb3, thickness: f32) {
        self.layer.set_outline_color(color(stroke));
        self.layer.set_outline_thickness(thickness);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x1), Mm(y1)), false),
                (Point::new(Mm(x2), Mm(y2)), false),
            ],
            is_closed: false,
        });
    }

    /// Place an image scaled to fit a square box whose lower-left corner is (x, y)
    fn image(&self, path: &Path, x: f32, y: f32, size: f32) {
        let decoded = match image_crate::open(path) {
            Ok(img) => img,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not decode image, skipping");
                return;
            }
        };

        // Alpha channels are flattened; the PDF only needs the colour data
        let buffer = decoded.to_rgb8();
        let (width, height) = buffer.dimensions();
        let rgb = DynamicImage::ImageRgb8(buffer);
        let (width, height) = (width.max(1) as f32, height.max(1) as f32);
        let dpi = 300.0;
        let native_mm = width.max(height) / dpi * 25.4;
        let scale = size / native_mm;

        Image::from_dynamic_image(&rgb).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(x)),
                translate_y: Some(Mm(y)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
    }
}

fn draw_header(canvas: &Canvas, layout: &DocumentLayout) {
    let (top, bottom) = (PAGE_HEIGHT - 15.0, PAGE_HEIGHT - 37.0);
    canvas.fill_rect(MARGIN, bottom, PAGE_WIDTH - MARGIN, top, LIGHT_BLUE);
    canvas.line(MARGIN, top, PAGE_WIDTH - MARGIN, top, DARK_GREEN, 1.5);
    canvas.line(MARGIN, bottom, PAGE_WIDTH - MARGIN, bottom, DARK_GREEN, 1.5);

    if let Some(logo) = &layout.logo {
        canvas.image(logo, MARGIN + 3.0, bottom + 2.0, 18.0);
    }

    canvas.text(
        &layout.institution,
        20.0,
        MARGIN + 30.0,
        bottom + 8.0,
        true,
        DARK_GREEN,
    );
}

fn draw_title(canvas: &Canvas, layout: &DocumentLayout) {
    let baseline = 240.0;

    if let Some(photo) = &layout.photo {
        canvas.fill_rect(MARGIN, baseline - 6.0, 150.0, baseline + 10.0, WHITE_SMOKE);
        canvas.image(photo, TABLE_RIGHT - 32.0, 222.0, 32.0);
    }

    canvas.text(TITLE, 15.0, MARGIN + 2.0, baseline, true, DARK_BLUE);
}

fn draw_table(canvas: &mut Canvas, layout: &DocumentLayout) {
    let header_height = LINE_HEIGHT + CELL_PADDING * 2.0;
    canvas.ensure_space(header_height);

    let top = canvas.y;
    canvas.fill_rect(LABEL_X, top - header_height, TABLE_RIGHT, top, DARK_BLUE);
    canvas.text("Field", 11.0, LABEL_X + 18.0, top - header_height + 3.0, true, WHITE_SMOKE);
    canvas.text("Details", 11.0, VALUE_X + 52.0, top - header_height + 3.0, true, WHITE_SMOKE);
    canvas.y -= header_height;

    for row in &layout.rows {
        // Rows taller than the rest of the page continue on the next one
        let mut start = 0;
        loop {
            canvas.ensure_space(LINE_HEIGHT + CELL_PADDING * 2.0);
            let room = (canvas.y - BOTTOM_LIMIT - CELL_PADDING * 2.0) / LINE_HEIGHT;
            let fits = (room.floor() as usize).max(1);
            let end = (start + fits).min(row.lines.len());

            let label = if start == 0 { row.label } else { "" };
            draw_row(canvas, label, &row.lines[start..end]);

            start = end;
            if start >= row.lines.len() {
                break;
            }
        }
    }

    canvas.line(LABEL_X, canvas.y, TABLE_RIGHT, canvas.y, BLACK, 1.0);
}

fn draw_row(canvas: &mut Canvas, label: &str, lines: &[String]) {
    let height = lines.len() as f32 * LINE_HEIGHT + CELL_PADDING * 2.0;
    let top = canvas.y;
    let bottom = top - height;
    canvas.fill_rect(LABEL_X, bottom, TABLE_RIGHT, top, LIGHT_YELLOW);

    canvas.text(label, 10.0, LABEL_X + 2.0, top - CELL_PADDING - 4.0, true, BLACK);
    for (i, line) in lines.iter().enumerate() {
        let y = top - CELL_PADDING - 4.0 - i as f32 * LINE_HEIGHT;
        canvas.text(line, 10.0, VALUE_X + 2.0, y, false, BLACK);
    }

    canvas.line(LABEL_X, bottom, TABLE_RIGHT, bottom, GREY, 0.5);
    canvas.line(VALUE_X, bottom, VALUE_X, top, GREY, 0.5);
    canvas.line(LABEL_X, bottom, LABEL_X, top, BLACK, 1.0);
    canvas.line(TABLE_RIGHT, bottom, TABLE_RIGHT, top, BLACK, 1.0);
    canvas.y = bottom;
}

fn draw_declaration(canvas: &mut Canvas) {
    canvas.ensure_space(30.0);
    canvas.y -= 12.0;

    canvas.text(DECLARATION_HEADING, 11.0, MARGIN, canvas.y, true, RED);
    for sentence in DECLARATION {
        canvas.y -= 5.5;
        canvas.text(sentence, 9.0, MARGIN, canvas.y, false, BLACK);
    }
}

fn draw_signatures(canvas: &mut Canvas) {
    canvas.ensure_space(35.0);
    canvas.y -= 28.0;

    let columns = [(30.0, 90.0), (120.0, 180.0)];
    for ((left, right), label) in columns.into_iter().zip(SIGNATURES) {
        canvas.line(left, canvas.y, right, canvas.y, BLACK, 0.8);
        canvas.text(label, 10.0, left + 12.0, canvas.y - 5.0, true, DARK_BLUE);
    }
}

fn draw_footer(canvas: &Canvas) {
    let stamp = Local::now().format("%d-%m-%Y %H:%M");
    canvas.text(
        &format!("Generated on {stamp}"),
        8.0,
        MARGIN,
        12.0,
        false,
        GREY,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_registration() -> Registration {
        Registration {
            id: "REG005".to_string(),
            name: "Asha Verma".to_string(),
            father_name: "Ramesh Verma".to_string(),
            mother_name: "Sunita Verma".to_string(),
            dob: "14-08-2004".to_string(),
            mobile: "9876543210".to_string(),
            aadhaar: "123412341234".to_string(),
            address: "12, Civil Lines\nNear Clock Tower".to_string(),
            city: "Moradabad".to_string(),
            state: "Uttar Pradesh".to_string(),
            pin: "244001".to_string(),
            course: "Web Development".to_string(),
            photo: String::new(),
        }
    }

    fn read_prefix(path: &Path) -> Vec<u8> {
        fs::read(path).unwrap().into_iter().take(5).collect()
    }

    #[test]
    fn test_document_file_name() {
        assert_eq!(document_file_name("REG001", "pdf"), "registration_REG001.pdf");
        assert_eq!(document_file_name("REG1000", "pdf"), "registration_REG1000.pdf");
    }

    #[test]
    fn test_wrap_lines() {
        assert_eq!(wrap_lines("", 10), vec![""]);
        assert_eq!(wrap_lines("short", 10), vec!["short"]);
        assert_eq!(
            wrap_lines("one two three four", 9),
            vec!["one two", "three", "four"]
        );
        assert_eq!(wrap_lines("line one\nline two", 40), vec!["line one", "line two"]);
        assert_eq!(wrap_lines("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_lines_multibyte() {
        let lines = wrap_lines("मुरादाबाद उत्तर प्रदेश", 8);
        assert!(lines.iter().all(|l| l.chars().count() <= 8));
        assert_eq!(lines.concat().replace(' ', ""), "मुरादाबादउत्तरप्रदेश");
    }

    #[test]
    fn test_layout_skips_photo_row() {
        let layout = DocumentLayout::for_record(
            &create_test_registration(),
            "YUG COMPUTER CENTER",
            None,
            None,
        );

        assert_eq!(layout.rows.len(), 12);
        assert_eq!(layout.rows[0].label, "Registration No");
        assert_eq!(layout.rows[0].lines, vec!["REG005"]);
        assert!(layout.rows.iter().all(|row| row.label != "Photo"));

        let address = layout.rows.iter().find(|row| row.label == "Address").unwrap();
        assert_eq!(address.lines, vec!["12, Civil Lines", "Near Clock Tower"]);
        assert_eq!(layout.line_count(), 13);
    }

    #[test]
    fn test_layout_drops_missing_images() {
        let layout = DocumentLayout::for_record(
            &create_test_registration(),
            "YUG COMPUTER CENTER",
            Some(Path::new("/nonexistent/college_logo.png")),
            Some(Path::new("/nonexistent/photo.jpg")),
        );

        assert_eq!(layout.logo, None);
        assert_eq!(layout.photo, None);
    }

    #[test]
    fn test_render_without_images() {
        let dir = TempDir::new().unwrap();
        let renderer = PdfRenderer::new(
            "YUG COMPUTER CENTER",
            Some(dir.path().join("college_logo.png")),
        );
        let record = create_test_registration();

        let path = renderer
            .render(&record, Some(Path::new("/nonexistent/photo.jpg")), dir.path())
            .unwrap();

        assert_eq!(path, dir.path().join("registration_REG005.pdf"));
        assert_eq!(read_prefix(&path), b"%PDF-");
    }

    #[test]
    fn test_render_with_images() {
        let dir = TempDir::new().unwrap();
        let photo = dir.path().join("photo.png");
        let logo = dir.path().join("logo.png");
        image_crate::RgbImage::from_pixel(40, 50, image_crate::Rgb([200, 120, 40]))
            .save(&photo)
            .unwrap();
        image_crate::RgbImage::from_pixel(30, 30, image_crate::Rgb([0, 90, 0]))
            .save(&logo)
            .unwrap();

        let renderer = PdfRenderer::new("YUG COMPUTER CENTER", Some(logo));
        let path = renderer
            .render(&create_test_registration(), Some(&photo), &dir.path().join("out"))
            .unwrap();

        assert_eq!(path, dir.path().join("out").join("registration_REG005.pdf"));
        assert_eq!(read_prefix(&path), b"%PDF-");
    }

    #[test]
    fn test_render_tolerates_undecodable_photo() {
        let dir = TempDir::new().unwrap();
        let photo = dir.path().join("photo.png");
        fs::write(&photo, "not an image").unwrap();

        let renderer = PdfRenderer::new("YUG COMPUTER CENTER", None);
        let path = renderer
            .render(&create_test_registration(), Some(&photo), dir.path())
            .unwrap();

        assert!(path.is_file());
    }

    #[test]
    fn test_render_long_address_spills_to_next_page() {
        let dir = TempDir::new().unwrap();
        let mut record = create_test_registration();
        record.address = "Ward 4, Gali 7 ".repeat(300);

        let renderer = PdfRenderer::new("YUG COMPUTER CENTER", None);
        let layout = renderer.layout(&record, None);
        assert!(layout.line_count() > 60);

        let path = renderer.render(&record, None, dir.path()).unwrap();
        assert!(path.is_file());
    }
}
