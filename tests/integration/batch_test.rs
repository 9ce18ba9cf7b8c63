// Batch watermarking integration tests

use super::test_harness::write_picture;
use image::Rgb;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use watermark_me::config::Config;
use watermark_me::watermark::{
    apply_watermarks, Color, ProcessingResult, WatermarkRequest, WatermarkStyle,
};

fn request(paths: Vec<PathBuf>, extensions: &[&str]) -> WatermarkRequest {
    WatermarkRequest {
        paths,
        text: String::new(),
        picture: None,
        style: WatermarkStyle {
            opacity: 0.25,
            font: PathBuf::from("/nonexistent/font.ttf"),
            color: Color::white(),
        },
        extensions: extensions.iter().map(|e| e.to_string()).collect(),
    }
}

fn run(request: &WatermarkRequest) -> Vec<ProcessingResult> {
    apply_watermarks(request)
        .collect::<Result<Vec<_>, _>>()
        .expect("batch failed")
}

#[test]
fn test_nested_directories_are_walked() {
    let dir = TempDir::new().unwrap();
    let gray = Rgb([128, 128, 128]);
    write_picture(dir.path(), "top.png", 16, 16, gray);
    write_picture(dir.path(), "a/one.png", 16, 16, gray);
    write_picture(dir.path(), "a/b/c/deep.png", 16, 16, gray);
    write_picture(dir.path(), "a/skipped.bmp", 16, 16, gray);

    let results = run(&request(vec![dir.path().to_path_buf()], &["png"]));

    let mut originals: Vec<_> = results.iter().map(|r| r.original.clone()).collect();
    originals.sort();
    assert_eq!(
        originals,
        vec![
            dir.path().join("a/b/c/deep.png"),
            dir.path().join("a/one.png"),
            dir.path().join("top.png"),
        ]
    );
    assert!(results.iter().all(|r| r.output.is_some()));
    assert!(dir.path().join("a/b/c/deep-w.jpg").exists());
    assert!(!dir.path().join("a/skipped-w.jpg").exists());
}

#[test]
fn test_mixed_inputs_in_order() {
    let dir = TempDir::new().unwrap();
    let single = write_picture(dir.path(), "single.bmp", 8, 8, Rgb([1, 2, 3]));
    let folder = dir.path().join("folder");
    write_picture(&folder, "inside.png", 8, 8, Rgb([1, 2, 3]));

    let results = run(&request(
        vec![
            single.clone(),
            dir.path().join("does-not-exist"),
            folder.clone(),
        ],
        &["png"],
    ));

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].original, single);
    assert_eq!(results[0].output, Some(dir.path().join("single-w.jpg")));
    assert_eq!(results[1].original, folder.join("inside.png"));
}

#[test]
fn test_unreadable_files_yield_no_output() {
    let dir = TempDir::new().unwrap();
    write_picture(dir.path(), "good.png", 8, 8, Rgb([10, 10, 10]));
    fs::write(dir.path().join("bad.png"), b"truncated").unwrap();

    let results = run(&request(vec![dir.path().to_path_buf()], &["png"]));

    assert_eq!(results.len(), 2);
    let bad = results
        .iter()
        .find(|r| r.original.ends_with("bad.png"))
        .unwrap();
    assert_eq!(bad.output, None);
    let good = results
        .iter()
        .find(|r| r.original.ends_with("good.png"))
        .unwrap();
    assert_eq!(good.output, Some(dir.path().join("good-w.jpg")));
}

#[test]
fn test_second_run_reuses_outputs() {
    let dir = TempDir::new().unwrap();
    write_picture(dir.path(), "x.png", 8, 8, Rgb([0, 0, 0]));
    write_picture(dir.path(), "y.png", 8, 8, Rgb([0, 0, 0]));
    let request = request(vec![dir.path().to_path_buf()], &["png"]);

    let first = run(&request);
    let modified: Vec<_> = first
        .iter()
        .map(|r| fs::metadata(r.output.as_ref().unwrap()).unwrap().modified().unwrap())
        .collect();

    let second = run(&request);

    assert_eq!(
        first.iter().map(|r| &r.output).collect::<Vec<_>>(),
        second.iter().map(|r| &r.output).collect::<Vec<_>>()
    );
    for (result, before) in second.iter().zip(modified) {
        let after = fs::metadata(result.output.as_ref().unwrap())
            .unwrap()
            .modified()
            .unwrap();
        assert_eq!(after, before);
    }
}

#[test]
fn test_batch_is_lazy() {
    let dir = TempDir::new().unwrap();
    write_picture(dir.path(), "1.png", 8, 8, Rgb([0, 0, 0]));
    write_picture(dir.path(), "2.png", 8, 8, Rgb([0, 0, 0]));
    let request = request(vec![dir.path().to_path_buf()], &["png"]);

    let mut batch = apply_watermarks(&request);
    let first = batch.next().unwrap().unwrap();

    let produced: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with("-w.jpg"))
        .collect();
    assert_eq!(produced.len(), 1);
    assert!(first.output.unwrap().exists());

    drop(batch);
}

#[test]
fn test_request_from_config() {
    let dir = TempDir::new().unwrap();
    let logo = write_picture(dir.path(), "logo.png", 4, 4, Rgb([0, 0, 0]));

    let config = Config {
        picture: logo.clone(),
        color: "#F00".to_string(),
        opacity: 0.75,
        ..Default::default()
    };
    let request = WatermarkRequest::from_config(&config, vec![dir.path().to_path_buf()]).unwrap();

    assert_eq!(request.picture, Some(logo));
    assert_eq!(request.text, config.text);
    assert_eq!(request.style.color, Color::new(255, 0, 0));
    assert_eq!(request.style.opacity, 0.75);
    assert_eq!(request.extensions, vec!["jpg", "png"]);

    let config = Config::default();
    let request = WatermarkRequest::from_config(&config, vec![]).unwrap();
    assert_eq!(request.picture, None);
}

#[test]
fn test_request_from_config_rejects_bad_color() {
    let config = Config {
        color: "red".to_string(),
        ..Default::default()
    };
    assert!(WatermarkRequest::from_config(&config, vec![]).is_err());
}
