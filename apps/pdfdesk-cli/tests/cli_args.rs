use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("pdfdesk").unwrap()
}

/// A Letter-sized PDF whose page `n` shows the text `Page n`.
fn sample_pdf(num_pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let mut kids = Vec::new();
    for i in 0..num_pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
                Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("Page {}", i + 1).into_bytes(),
                        StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
        let resources = Dictionary::from_iter(vec![(
            "Font",
            Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
        )]);
        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            ),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]);
        kids.push(doc.add_object(page));
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(num_pages as i64)),
        (
            "Kids",
            Object::Array(kids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn write_pdf(dir: &Path, name: &str, pages: u32) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, sample_pdf(pages)).unwrap();
    path
}

fn page_count(path: &Path) -> usize {
    Document::load(path).unwrap().get_pages().len()
}

#[test]
fn help_flag_prints_usage_with_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("merge"))
        .stdout(predicate::str::contains("split"))
        .stdout(predicate::str::contains("watermark"))
        .stdout(predicate::str::contains("from-images"));
}

#[test]
fn no_args_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn split_requires_pages() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_pdf(tmp.path(), "in.pdf", 3);
    cmd()
        .arg("split")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--pages"));
}

#[test]
fn merge_writes_merged_pdf() {
    let tmp = tempfile::tempdir().unwrap();
    let a = write_pdf(tmp.path(), "a.pdf", 2);
    let b = write_pdf(tmp.path(), "b.pdf", 3);
    let out = tmp.path().join("out");

    cmd()
        .arg("merge")
        .arg(&a)
        .arg(&b)
        .arg("--out-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("merged.pdf"))
        .stderr(predicate::str::contains("[Ready] Merged and downloaded as merged.pdf"));

    assert_eq!(page_count(&out.join("merged.pdf")), 5);
}

#[test]
fn merge_with_one_file_reports_validation_error() {
    let tmp = tempfile::tempdir().unwrap();
    let a = write_pdf(tmp.path(), "a.pdf", 2);

    cmd()
        .arg("merge")
        .arg(&a)
        .arg("-o")
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("[Error] Need at least 2 PDFs to merge."));
}

#[test]
fn split_extracts_selected_pages() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_pdf(tmp.path(), "in.pdf", 10);

    cmd()
        .args(["split", "--pages", "1-3,5"])
        .arg(&input)
        .arg("-o")
        .arg(tmp.path())
        .assert()
        .success();

    assert_eq!(page_count(&tmp.path().join("split.pdf")), 4);
}

#[test]
fn split_with_only_invalid_pages_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_pdf(tmp.path(), "in.pdf", 3);

    cmd()
        .args(["split", "--pages", "0,abc"])
        .arg(&input)
        .arg("-o")
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No valid pages to split."));

    assert!(!tmp.path().join("split.pdf").exists());
}

#[test]
fn text_export_uses_config_format() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_pdf(tmp.path(), "in.pdf", 2);
    let config = tmp.path().join("pdfdesk.toml");
    fs::write(&config, "[export]\nformat = \"markdown\"\n").unwrap();

    cmd()
        .arg("text")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .arg("-o")
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("export.md"));

    let text = fs::read_to_string(tmp.path().join("export.md")).unwrap();
    assert!(text.starts_with("## Page 1"));
}

#[test]
fn config_output_dir_is_used() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_pdf(tmp.path(), "in.pdf", 2);
    let out = tmp.path().join("from-config");
    let config = tmp.path().join("custom.toml");
    fs::write(&config, format!("[output]\ndir = {:?}\n", out.display().to_string())).unwrap();

    cmd()
        .args(["rotate", "--degrees", "-90"])
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    assert!(out.join("rotated.pdf").exists());
}

#[test]
fn invalid_config_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_pdf(tmp.path(), "in.pdf", 1);
    let config = tmp.path().join("bad.toml");
    fs::write(&config, "[compress]\nlevel = \"high\"\n").unwrap();

    cmd()
        .arg("compress")
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config file"));
}

#[test]
fn info_prints_page_details() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_pdf(tmp.path(), "in.pdf", 2);

    cmd()
        .arg("info")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Pages:     2"))
        .stdout(predicate::str::contains("Page 2: 612 x 792 pt"));
}

#[test]
fn info_json_output() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_pdf(tmp.path(), "in.pdf", 3);

    let output = cmd().arg("info").arg(&input).arg("--json").output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["page_count"], 3);
    assert_eq!(json["pages"][0]["orientation"], "Portrait");
}

#[test]
fn non_pdf_input_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let notes = tmp.path().join("notes.txt");
    fs::write(&notes, "hello").unwrap();

    cmd()
        .arg("flatten")
        .arg(&notes)
        .arg("-o")
        .arg(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please add valid PDF or image files."));
}
