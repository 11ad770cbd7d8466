mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use common::{page_contents, page_widths, sample_pdf};

/// Run the pre-built binary directly.
/// This avoids `cargo run` build-lock contention when tests run in parallel.
fn run_cli(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let bin = PathBuf::from(env!("CARGO_BIN_EXE_pdfworks"));
    let output = Command::new(&bin)
        .args(args)
        .arg("-o")
        .arg(dir.join("out"))
        .current_dir(dir)
        .output()
        .expect("Failed to execute pdfworks");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn write_pdf(dir: &Path, name: &str, widths: &[i64]) -> String {
    let path = dir.join(name);
    fs::write(&path, sample_pdf(widths)).unwrap();
    path.display().to_string()
}

#[test]
fn test_arrange_command() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_pdf(dir.path(), "in.pdf", &[100, 200, 300]);
    let (stdout, stderr, ok) = run_cli(
        dir.path(),
        &["arrange", &input, "--op", "move:1:3", "--op", "dup:2", "--op", "del:1"],
    );
    assert!(ok, "arrange failed: {stderr}");
    assert!(stdout.contains("Successfully wrote"));

    let out = fs::read(dir.path().join("out/arranged.pdf")).unwrap();
    assert_eq!(page_widths(&out), vec![300, 300, 100]);
}

#[test]
fn test_split_command() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_pdf(dir.path(), "in.pdf", &[100, 200, 300, 400]);
    let (_, stderr, ok) = run_cli(dir.path(), &["split", &input, "--pages", "4,2-3"]);
    assert!(ok, "split failed: {stderr}");
    let out = fs::read(dir.path().join("out/split.pdf")).unwrap();
    assert_eq!(page_widths(&out), vec![200, 300, 400]);
}

#[test]
fn test_merge_command() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", &[100]);
    let b = write_pdf(dir.path(), "b.pdf", &[200, 300]);
    let (_, stderr, ok) = run_cli(dir.path(), &["merge", &b, &a]);
    assert!(ok, "merge failed: {stderr}");
    let out = fs::read(dir.path().join("out/merged.pdf")).unwrap();
    assert_eq!(page_widths(&out), vec![200, 300, 100]);
}

#[test]
fn test_merge_needs_two_files() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_pdf(dir.path(), "a.pdf", &[100]);
    let (_, _, ok) = run_cli(dir.path(), &["merge", &a]);
    assert!(!ok);
}

#[test]
fn test_draw_command() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_pdf(dir.path(), "in.pdf", &[200, 200]);
    let png = dir.path().join("ink.png");
    let mut ink = image::RgbaImage::new(300, 600);
    for x in 10..100 {
        ink.put_pixel(x, 50, image::Rgba([0, 0, 0, 255]));
    }
    ink.save(&png).unwrap();

    let overlay = format!("2:{}", png.display());
    let (_, stderr, ok) = run_cli(dir.path(), &["draw", &input, "--overlay", &overlay]);
    assert!(ok, "draw failed: {stderr}");
    let contents = page_contents(&fs::read(dir.path().join("out/annotated.pdf")).unwrap());
    assert!(!contents[0].contains(" Do"));
    assert!(contents[1].contains(" Do"));
}

#[test]
fn test_edit_command() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_pdf(dir.path(), "in.pdf", &[200]);
    let blocks = dir.path().join("blocks.json");
    fs::write(
        &blocks,
        r##"[{"page": 0, "x": 30, "y": 60, "text": "Reviewed", "font_size": 24, "color": "#ef4444"}]"##,
    )
    .unwrap();

    let blocks_arg = blocks.display().to_string();
    let (_, stderr, ok) = run_cli(dir.path(), &["edit", &input, "--blocks", &blocks_arg]);
    assert!(ok, "edit failed: {stderr}");
    let contents = page_contents(&fs::read(dir.path().join("out/edited.pdf")).unwrap());
    assert!(contents[0].contains("(Reviewed) Tj"));
    assert!(contents[0].contains("20 344 Td"));
}

#[test]
fn test_to_image_command() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_pdf(dir.path(), "in.pdf", &[100, 200]);

    let (stdout, stderr, ok) = run_cli(dir.path(), &["to-image", &input, "--pages", "1"]);
    if cfg!(feature = "pdfium") {
        // the library may still be missing at runtime
        if ok {
            assert!(dir.path().join("out/page-1.png").exists());
        }
        return;
    }
    assert!(!ok, "blank pages were exported: {stdout}");
    assert!(stderr.contains("--features pdfium"), "unexpected error: {stderr}");
    assert!(!dir.path().join("out").join("page-1.png").exists());
}

#[test]
fn test_info_command() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_pdf(dir.path(), "in.pdf", &[100, 200]);
    let (stdout, _, ok) = run_cli(dir.path(), &["info", &input]);
    assert!(ok);
    assert!(stdout.contains("in.pdf: 2 pages"));
    assert!(stdout.contains("page 2: 200 x 400 pt"));
}

#[test]
fn test_not_a_pdf_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("notes.txt");
    fs::write(&input, "hello").unwrap();
    let input = input.display().to_string();
    let (_, stderr, ok) = run_cli(dir.path(), &["split", &input, "--pages", "1"]);
    assert!(!ok);
    assert!(stderr.contains("not a PDF"));
}

#[test]
fn test_config_file_sets_edit_scale() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_pdf(dir.path(), "in.pdf", &[200]);
    let blocks = dir.path().join("blocks.json");
    fs::write(
        &blocks,
        r##"[{"page": 0, "x": 30, "y": 60, "text": "Reviewed", "font_size": 24, "color": "#000000"}]"##,
    )
    .unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{"edit_scale": 1.0}"#).unwrap();

    let config_arg = config.display().to_string();
    let blocks_arg = blocks.display().to_string();
    let (_, stderr, ok) = run_cli(
        dir.path(),
        &["--config", &config_arg, "edit", &input, "--blocks", &blocks_arg],
    );
    assert!(ok, "edit failed: {stderr}");
    let contents = page_contents(&fs::read(dir.path().join("out/edited.pdf")).unwrap());
    assert!(contents[0].contains("24 Tf"));
    assert!(contents[0].contains("30 316 Td"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_pdf(dir.path(), "in.pdf", &[100]);
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{"edit_scale": 0}"#).unwrap();
    let config_arg = config.display().to_string();

    let (_, stderr, ok) = run_cli(dir.path(), &["--config", &config_arg, "info", &input]);
    assert!(!ok);
    assert!(stderr.contains("edit_scale"), "unexpected error: {stderr}");
}
