//! Integration tests for the watermark pipeline

use chrono::NaiveDate;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use pdf_watermark::clock::FixedClock;
use pdf_watermark::pdf::{count_pages, WatermarkSpec};
use pdf_watermark::pipeline::{load_recipients, run, RunOptions};
use pdf_watermark::Error;

fn fixture_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
}

/// Write a synthetic PDF with one page per entry in `page_texts`.
fn write_test_pdf(path: &Path, page_texts: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in page_texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode fixture content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc.save(path).expect("save fixture PDF");
}

/// True if any stream in the (decompressed) document contains `needle`.
fn pdf_contains(path: &Path, needle: &str) -> bool {
    let mut doc = Document::load(path).expect("load output PDF");
    doc.decompress();

    let needle = needle.as_bytes();
    doc.objects.values().any(|object| match object {
        Object::Stream(stream) => stream
            .content
            .windows(needle.len())
            .any(|window| window == needle),
        _ => false,
    })
}

fn options(input: &Path, output_base: &Path, recipients: &[&str]) -> RunOptions {
    RunOptions {
        input_path: input.to_path_buf(),
        output_base: output_base.to_path_buf(),
        recipients: recipients.iter().map(|s| s.to_string()).collect(),
    }
}

#[test]
fn test_single_recipient_two_pages() {
    let temp_dir = TempDir::new().expect("temp dir");
    let input = temp_dir.path().join("report.pdf");
    write_test_pdf(&input, &["First page body", "Second page body"]);

    let opts = options(&input, &temp_dir.path().join("out.pdf"), &["Jane Doe"]);
    let written = run(&opts, &FixedClock(fixture_date())).expect("run pipeline");

    assert_eq!(written.len(), 1);
    let expected = temp_dir.path().join("out_Jane_Doe_01-15-2024.pdf");
    assert_eq!(written[0], expected);
    assert!(expected.exists());

    // Page count preserved
    assert_eq!(count_pages(&expected).unwrap(), 2);

    // All four watermark fragments are present in the output
    let spec = WatermarkSpec::for_recipient("Jane Doe", &fixture_date());
    assert!(pdf_contains(&expected, "Jane Doe"));
    assert!(pdf_contains(&expected, "01-15-2024"));
    for word in spec.prefix_text.split_whitespace() {
        assert!(pdf_contains(&expected, word), "missing prefix word {:?}", word);
    }
    for word in spec.suffix_text.split_whitespace() {
        assert!(pdf_contains(&expected, word), "missing suffix word {:?}", word);
    }

    // Original page content survives the merge
    assert!(pdf_contains(&expected, "First page body"));
    assert!(pdf_contains(&expected, "Second page body"));
}

#[test]
fn test_multi_recipient_order_and_files() {
    let temp_dir = TempDir::new().expect("temp dir");
    let input = temp_dir.path().join("report.pdf");
    write_test_pdf(&input, &["Only page"]);

    let opts = options(&input, &temp_dir.path().join("out.pdf"), &["Alice", "Bob"]);
    let written = run(&opts, &FixedClock(fixture_date())).expect("run pipeline");

    assert_eq!(
        written,
        vec![
            temp_dir.path().join("out_Alice_01-15-2024.pdf"),
            temp_dir.path().join("out_Bob_01-15-2024.pdf"),
        ]
    );
    for path in &written {
        assert!(path.exists());
        assert_eq!(count_pages(path).unwrap(), 1);
    }
    assert!(pdf_contains(&written[0], "Alice"));
    assert!(pdf_contains(&written[1], "Bob"));
}

#[test]
fn test_name_file_matches_explicit_names() {
    let temp_dir = TempDir::new().expect("temp dir");
    let name_file = temp_dir.path().join("names.txt");
    fs::write(&name_file, "Alice\nBob\n").expect("write name file");

    let from_file = load_recipients(None, Some(&name_file)).unwrap();
    assert_eq!(from_file, vec!["Alice".to_string(), "Bob".to_string()]);

    // Blank lines (including a trailing newline) never become recipients
    fs::write(&name_file, "Alice\n\nBob\n\n").expect("rewrite name file");
    let from_file = load_recipients(None, Some(&name_file)).unwrap();
    assert_eq!(from_file, vec!["Alice".to_string(), "Bob".to_string()]);
}

#[test]
fn test_name_file_run_produces_same_outputs() {
    let temp_dir = TempDir::new().expect("temp dir");
    let input = temp_dir.path().join("report.pdf");
    write_test_pdf(&input, &["Only page"]);

    let name_file = temp_dir.path().join("names.txt");
    fs::write(&name_file, "Alice\nBob\n").expect("write name file");
    let recipients = load_recipients(None, Some(&name_file)).unwrap();

    let opts = RunOptions {
        input_path: input.clone(),
        output_base: temp_dir.path().join("out.pdf"),
        recipients,
    };
    let written = run(&opts, &FixedClock(fixture_date())).expect("run pipeline");

    assert_eq!(
        written,
        vec![
            temp_dir.path().join("out_Alice_01-15-2024.pdf"),
            temp_dir.path().join("out_Bob_01-15-2024.pdf"),
        ]
    );
}

#[test]
fn test_missing_input_creates_no_files() {
    let temp_dir = TempDir::new().expect("temp dir");
    let opts = options(
        &temp_dir.path().join("missing.pdf"),
        &temp_dir.path().join("out.pdf"),
        &["Alice"],
    );

    let result = run(&opts, &FixedClock(fixture_date()));
    assert!(matches!(result, Err(Error::FileNotFound(_))));

    let leftovers: Vec<PathBuf> = fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert!(leftovers.is_empty(), "no output files expected: {:?}", leftovers);
}

#[test]
fn test_no_recipients_is_a_configuration_error() {
    let result = load_recipients(None, None);
    assert!(matches!(result, Err(Error::NoRecipients)));
}

#[test]
fn test_duplicate_names_last_writer_wins() {
    let temp_dir = TempDir::new().expect("temp dir");
    let input = temp_dir.path().join("report.pdf");
    write_test_pdf(&input, &["Only page"]);

    let opts = options(&input, &temp_dir.path().join("out.pdf"), &["Alice", "Alice"]);
    let written = run(&opts, &FixedClock(fixture_date())).expect("run pipeline");

    // Both iterations run; both derive the same filename
    assert_eq!(written.len(), 2);
    assert_eq!(written[0], written[1]);

    let outputs: Vec<PathBuf> = fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path != &input)
        .collect();
    assert_eq!(outputs.len(), 1, "exactly one file survives: {:?}", outputs);
}

#[test]
fn test_source_document_is_untouched() {
    let temp_dir = TempDir::new().expect("temp dir");
    let input = temp_dir.path().join("report.pdf");
    write_test_pdf(&input, &["Only page"]);
    let before = fs::read(&input).unwrap();

    let opts = options(&input, &temp_dir.path().join("out.pdf"), &["Alice"]);
    run(&opts, &FixedClock(fixture_date())).expect("run pipeline");

    let after = fs::read(&input).unwrap();
    assert_eq!(before, after, "source bytes must not change");
}

#[test]
fn test_rerun_is_structurally_identical() {
    let temp_dir = TempDir::new().expect("temp dir");
    let input = temp_dir.path().join("report.pdf");
    write_test_pdf(&input, &["Page one", "Page two", "Page three"]);

    let opts = options(&input, &temp_dir.path().join("out.pdf"), &["Alice"]);
    let first = run(&opts, &FixedClock(fixture_date())).expect("first run");
    let second = run(&opts, &FixedClock(fixture_date())).expect("second run");

    assert_eq!(first, second);
    let output = &first[0];
    assert_eq!(count_pages(output).unwrap(), 3);
    assert!(pdf_contains(output, "Alice"));
    assert!(pdf_contains(output, "01-15-2024"));
}
