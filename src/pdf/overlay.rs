//! Watermark overlay generation
//!
//! Builds a single-page, letter-sized PDF containing the four watermark text
//! blocks (prefix phrase, recipient name, date, suffix phrase), each tilted
//! 30 degrees and filled black at 50% alpha. The overlay is returned as an
//! in-memory [`Document`] so the compositor can merge it onto every page of a
//! source PDF without re-rendering.
//!
//! Each block is rendered as an isolated `q`/`Q` group with an explicit
//! rotation matrix, so no transform leaks between blocks or into the page the
//! overlay is later merged onto.

use chrono::NaiveDate;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use crate::clock::format_date;
use crate::error::Result;
use crate::layout::{Anchor, PageDimensions};
use crate::style::{Alignment, TextStyle};

const PREFIX_TEXT: &str = include_str!("../../assets/prefix.txt");
const SUFFIX_TEXT: &str = include_str!("../../assets/suffix.txt");

/// Tilt applied to every text block, counter-clockwise about the page origin
pub const TILT_DEGREES: f32 = 30.0;

/// Paragraph wrap box width (4 inches)
const WRAP_BOX_PT: f32 = 288.0;

/// Line leading as a multiple of font size
const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Resource names the overlay content stream refers to. Deliberately unusual
/// so they cannot collide with names already used by source pages.
const FONT_RES_NAME: &str = "FWM";
const GS_RES_NAME: &str = "GSwm";

/// What to draw for one recipient.
///
/// The prefix and suffix phrases are fixed configuration embedded at compile
/// time; the recipient name and date vary per output.
#[derive(Debug, Clone)]
pub struct WatermarkSpec {
    pub prefix_text: String,
    pub suffix_text: String,
    pub recipient_name: String,
    /// Zero-padded `MM-DD-YYYY`
    pub date_text: String,
}

impl WatermarkSpec {
    /// Resolve the full spec for one recipient on the given date.
    pub fn for_recipient(recipient: &str, date: &NaiveDate) -> Self {
        Self {
            prefix_text: PREFIX_TEXT.trim().to_string(),
            suffix_text: SUFFIX_TEXT.trim().to_string(),
            recipient_name: recipient.to_string(),
            date_text: format_date(date),
        }
    }

    /// The four text blocks with their anchors, in draw order.
    ///
    /// Anchors are measured from the page's bottom-left origin, in the
    /// rotated frame. The X value is pushed right so the tilted column lands
    /// centered on the page.
    fn blocks(&self) -> [(&str, Anchor); 4] {
        [
            (self.prefix_text.as_str(), Anchor::from_inches(4.5, 6.0)),
            (self.recipient_name.as_str(), Anchor::from_inches(4.5, 3.5)),
            (self.date_text.as_str(), Anchor::from_inches(4.5, 3.3)),
            (self.suffix_text.as_str(), Anchor::from_inches(4.5, 0.0)),
        ]
    }
}

/// Build the single-page overlay document for one recipient.
///
/// The page is US Letter. Text is Helvetica (base-14, WinAnsiEncoding), so
/// nothing needs to be embedded; the 50% alpha comes from an ExtGState
/// referenced by every block.
pub fn build_overlay(spec: &WatermarkSpec) -> Result<Document> {
    let style = TextStyle::default();
    let page = PageDimensions::letter();

    let mut operations = Vec::new();
    for (text, anchor) in spec.blocks() {
        operations.extend(paragraph_ops(text, anchor, &style));
    }
    let content = Content { operations };

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => style.font_name,
        "Encoding" => "WinAnsiEncoding",
    });

    let gs_id = doc.add_object(dictionary! {
        "Type" => "ExtGState",
        "ca" => Object::Real(style.alpha),
        "CA" => Object::Real(style.alpha),
    });

    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            FONT_RES_NAME => font_id,
        },
        "ExtGState" => dictionary! {
            GS_RES_NAME => gs_id,
        },
    });

    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![
            0.into(),
            0.into(),
            page.width.pt().into(),
            page.height.pt().into(),
        ],
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    Ok(doc)
}

/// Operations for one paragraph: save state, rotate, set alpha and color,
/// then place each wrapped line with an absolute text matrix, restore state.
///
/// Coordinates inside the group are in the rotated frame; the anchor is the
/// lower-left corner of the paragraph's wrap box.
fn paragraph_ops(text: &str, anchor: Anchor, style: &TextStyle) -> Vec<Operation> {
    let lines = wrap_paragraph(text, WRAP_BOX_PT, style.font_size);
    let leading = style.font_size * LINE_HEIGHT_FACTOR;
    let (sin, cos) = TILT_DEGREES.to_radians().sin_cos();

    let mut ops = vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                cos.into(),
                sin.into(),
                (-sin).into(),
                cos.into(),
                0.into(),
                0.into(),
            ],
        ),
        Operation::new("gs", vec![Object::Name(GS_RES_NAME.as_bytes().to_vec())]),
        Operation::new(
            "rg",
            vec![
                style.color.r.into(),
                style.color.g.into(),
                style.color.b.into(),
            ],
        ),
    ];

    let line_count = lines.len();
    for (i, line) in lines.iter().enumerate() {
        let line_x = match style.alignment {
            Alignment::Center => {
                anchor.x.pt() + (WRAP_BOX_PT - text_width(line, style.font_size)) / 2.0
            }
            Alignment::Left => anchor.x.pt(),
        };
        // First line at the top of the paragraph, last baseline at the anchor
        let line_y = anchor.y.pt() + (line_count - 1 - i) as f32 * leading;

        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![FONT_RES_NAME.into(), style.font_size.into()],
        ));
        ops.push(Operation::new(
            "Tm",
            vec![
                1.into(),
                0.into(),
                0.into(),
                1.into(),
                line_x.into(),
                line_y.into(),
            ],
        ));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(line), StringFormat::Literal)],
        ));
        ops.push(Operation::new("ET", vec![]));
    }

    ops.push(Operation::new("Q", vec![]));
    ops
}

/// Word-wrap `text` so no line exceeds `max_width` points.
///
/// Newlines in the input are treated as ordinary word separators. Words
/// wider than the box are broken at character boundaries.
fn wrap_paragraph(text: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let space_width = text_width(" ", font_size);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width: f32 = 0.0;

    for word in text.split_whitespace() {
        let word_width = text_width(word, font_size);

        if word_width > max_width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_width = 0.0;
            }
            for c in word.chars() {
                let char_width = text_width(c.encode_utf8(&mut [0; 4]), font_size);
                if current_width + char_width > max_width && !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0.0;
                }
                current.push(c);
                current_width += char_width;
            }
            continue;
        }

        if current.is_empty() {
            current = word.to_string();
            current_width = word_width;
        } else if current_width + space_width + word_width <= max_width {
            current.push(' ');
            current.push_str(word);
            current_width += space_width + word_width;
        } else {
            lines.push(current);
            current = word.to_string();
            current_width = word_width;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// Measure a string in points at the given font size.
fn text_width(text: &str, font_size: f32) -> f32 {
    let milli: u32 = text.chars().map(glyph_width).sum();
    milli as f32 * font_size / 1000.0
}

/// Helvetica AFM advance width for one character, in 1/1000ths of the em
/// square. Characters outside the table fall back to the digit width.
fn glyph_width(c: char) -> u32 {
    let code = c as u32;
    match code {
        0x20..=0x7E => HELVETICA_WIDTHS[(code - 0x20) as usize],
        _ => 556,
    }
}

/// Helvetica widths for ASCII 32-126, from the Adobe AFM metrics
const HELVETICA_WIDTHS: [u32; 95] = [
    278, // 32 space
    278, // 33 !
    355, // 34 "
    556, // 35 #
    556, // 36 $
    889, // 37 %
    667, // 38 &
    191, // 39 '
    333, // 40 (
    333, // 41 )
    389, // 42 *
    584, // 43 +
    278, // 44 ,
    333, // 45 -
    278, // 46 .
    278, // 47 /
    556, // 48 0
    556, // 49 1
    556, // 50 2
    556, // 51 3
    556, // 52 4
    556, // 53 5
    556, // 54 6
    556, // 55 7
    556, // 56 8
    556, // 57 9
    278, // 58 :
    278, // 59 ;
    584, // 60 <
    584, // 61 =
    584, // 62 >
    556, // 63 ?
    1015, // 64 @
    667, // 65 A
    667, // 66 B
    722, // 67 C
    722, // 68 D
    667, // 69 E
    611, // 70 F
    778, // 71 G
    722, // 72 H
    278, // 73 I
    500, // 74 J
    667, // 75 K
    556, // 76 L
    833, // 77 M
    722, // 78 N
    778, // 79 O
    667, // 80 P
    778, // 81 Q
    722, // 82 R
    667, // 83 S
    611, // 84 T
    722, // 85 U
    667, // 86 V
    944, // 87 W
    667, // 88 X
    667, // 89 Y
    611, // 90 Z
    278, // 91 [
    278, // 92 \
    278, // 93 ]
    469, // 94 ^
    556, // 95 _
    333, // 96 `
    556, // 97 a
    556, // 98 b
    500, // 99 c
    556, // 100 d
    556, // 101 e
    278, // 102 f
    556, // 103 g
    556, // 104 h
    222, // 105 i
    222, // 106 j
    500, // 107 k
    222, // 108 l
    833, // 109 m
    556, // 110 n
    556, // 111 o
    556, // 112 p
    556, // 113 q
    333, // 114 r
    500, // 115 s
    278, // 116 t
    556, // 117 u
    500, // 118 v
    722, // 119 w
    500, // 120 x
    500, // 121 y
    500, // 122 z
    334, // 123 {
    260, // 124 |
    334, // 125 }
    584, // 126 ~
];

/// Encode text as single-byte WinAnsi. The Latin-1 range maps through
/// directly; anything else becomes '?'.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| {
            let code = c as u32;
            if (0x20..0x7F).contains(&code) || (0xA0..=0xFF).contains(&code) {
                code as u8
            } else {
                b'?'
            }
        })
        .collect()
}
