//! Balance report as a PDF document
//!
//! Emits a minimal PDF 1.4 file: US-Letter pages, the standard Helvetica
//! fonts, one content stream per page. Coordinates are kept in tenths of a
//! point so the layout arithmetic stays exact.
//!
//! Layout (points from the bottom-left corner):
//! - title "Inventory Balance Report", Helvetica-Bold 16, at (72, 720)
//! - column headers, Helvetica-Bold 10, at y = 684, x = 72 / 216 / 360
//! - rows, Helvetica 10, from y = 662.4 down in steps of 18
//! - once y falls below 72 the next row starts a new page at y = 720

use shared::models::BalanceRow;

pub const PDF_FILENAME: &str = "inventory_report.pdf";

const PAGE_WIDTH: i64 = 6120;
const PAGE_HEIGHT: i64 = 7920;
const INCH: i64 = 720;

const TITLE_Y: i64 = PAGE_HEIGHT - INCH;
const HEADER_Y: i64 = PAGE_HEIGHT - INCH * 3 / 2;
const FIRST_ROW_Y: i64 = HEADER_Y - 216;
const ROW_STEP: i64 = 180;
const BOTTOM_MARGIN: i64 = INCH;
const CONTINUATION_Y: i64 = PAGE_HEIGHT - INCH;

const COLUMNS: [i64; 3] = [INCH, INCH * 3, INCH * 5];

/// Vertical position of each row, grouped by page
fn paginate(rows: usize) -> Vec<Vec<i64>> {
    let mut pages = vec![Vec::new()];
    let mut y = FIRST_ROW_Y;
    let mut page_full = false;

    for _ in 0..rows {
        if page_full {
            pages.push(Vec::new());
            y = CONTINUATION_Y;
            page_full = false;
        }
        if let Some(page) = pages.last_mut() {
            page.push(y);
        }
        y -= ROW_STEP;
        page_full = y < BOTTOM_MARGIN;
    }

    pages
}

/// Render the balance report rows as a complete PDF file
pub fn render_balance_report(rows: &[BalanceRow]) -> Vec<u8> {
    let pages = paginate(rows.len());
    let mut streams = Vec::with_capacity(pages.len());
    let mut remaining = rows.iter();

    for (index, positions) in pages.iter().enumerate() {
        let mut content = Vec::new();
        if index == 0 {
            draw_text(&mut content, "F2", 16, COLUMNS[0], TITLE_Y, "Inventory Balance Report");
            for (x, label) in COLUMNS.iter().zip(["Product", "Location", "Quantity"]) {
                draw_text(&mut content, "F2", 10, *x, HEADER_Y, label);
            }
        }
        for (&y, row) in positions.iter().zip(remaining.by_ref()) {
            draw_text(&mut content, "F1", 10, COLUMNS[0], y, &row.product_name);
            draw_text(&mut content, "F1", 10, COLUMNS[1], y, &row.location_name);
            draw_text(&mut content, "F1", 10, COLUMNS[2], y, &row.qty.to_string());
        }
        streams.push(content);
    }

    assemble(&streams)
}

fn points(tenths: i64) -> String {
    format!("{}.{}", tenths / 10, tenths % 10)
}

fn draw_text(out: &mut Vec<u8>, font: &str, size: u32, x: i64, y: i64, text: &str) {
    out.extend_from_slice(
        format!("BT /{} {} Tf {} {} Td (", font, size, points(x), points(y)).as_bytes(),
    );
    out.extend_from_slice(&escape_text(text));
    out.extend_from_slice(b") Tj ET\n");
}

/// Encode a string literal body in WinAnsiEncoding, delimiters escaped
fn escape_text(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                bytes.push(b'\\');
                bytes.push(c as u8);
            }
            c => bytes.push(win_ansi(c).unwrap_or(b'?')),
        }
    }
    bytes
}

/// WinAnsiEncoding byte for a character, if the standard fonts can show it.
///
/// 0x20-0x7E and 0xA0-0xFF match Latin-1; 0x80-0x9F hold typographic
/// characters rather than the C1 controls.
fn win_ansi(c: char) -> Option<u8> {
    let code = c as u32;
    if (0x20..=0x7E).contains(&code) || (0xA0..=0xFF).contains(&code) {
        return Some(code as u8);
    }
    let byte = match c {
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Write objects, cross-reference table and trailer
fn assemble(streams: &[Vec<u8>]) -> Vec<u8> {
    // 1 catalog, 2 page tree, 3-4 fonts, then (page, content) pairs
    let page_ids: Vec<usize> = (0..streams.len()).map(|i| 5 + i * 2).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{} 0 R", id))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects: Vec<Vec<u8>> = vec![
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, streams.len()).into_bytes(),
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_vec(),
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    ];

    for (page_id, content) in page_ids.iter().zip(streams) {
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                points(PAGE_WIDTH),
                points(PAGE_HEIGHT),
                page_id + 1
            )
            .into_bytes(),
        );

        let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
        stream.extend_from_slice(content);
        stream.extend_from_slice(b"\nendstream");
        objects.push(stream);
    }

    let mut out = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", index + 1).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        )
        .as_bytes(),
    );

    out
}
