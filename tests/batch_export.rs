//! End-to-end test of the public library API: files on disk → batch →
//! edits → zip bundle and split export.
//!
//! Fixtures are synthesized into a temp directory with the `image` and `zip`
//! crates, so the test needs no checked-in binaries.

use image::{ImageFormat, Rgb, RgbImage};
use std::io::{Cursor, Read, Write};
use std::path::Path;
use tempfile::TempDir;
use theme_resizer::catalog::LayoutCatalog;
use theme_resizer::config;
use theme_resizer::imaging::{ResampleFilter, RustBackend};
use theme_resizer::pipeline::{self, BatchPipeline, PipelineEvent, PipelineOptions};
use theme_resizer::types::RecordUpdate;

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 128]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

fn write_zip(path: &Path, entries: &[(&str, Vec<u8>)]) {
    let mut zip = zip::ZipWriter::new(std::fs::File::create(path).unwrap());
    let options = zip::write::SimpleFileOptions::default();
    for (name, bytes) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(bytes).unwrap();
    }
    zip.finish().unwrap();
}

fn unzip(bytes: &[u8]) -> Vec<(String, (u32, u32))> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut file = archive.by_index(i).unwrap();
            let mut buf = Vec::new();
            file.read_to_end(&mut buf).unwrap();
            let img = image::load_from_memory(&buf).unwrap();
            (file.name().to_string(), (img.width(), img.height()))
        })
        .collect()
}

/// A drop folder with a matched jpeg, a zip of two members (one matched),
/// an unsupported rar, a stray text file, and an unmatched png.
fn setup_drop_folder() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    std::fs::write(root.join("a_cover_158A_final.jpg"), encode(80, 60, ImageFormat::Jpeg)).unwrap();
    write_zip(
        &root.join("b_pack.zip"),
        &[
            ("pack/night-264b.png", encode(30, 90, ImageFormat::Png)),
            ("pack/notes.txt", b"ignored".to_vec()),
            ("pack/extra.webp", encode(25, 15, ImageFormat::WebP)),
        ],
    );
    std::fs::write(root.join("c_old.rar"), b"Rar!\x1a\x07\x00").unwrap();
    std::fs::write(root.join("d_readme.txt"), b"hello").unwrap();
    std::fs::write(root.join("e_banner.png"), encode(120, 40, ImageFormat::Png)).unwrap();
    tmp
}

fn small_catalog() -> LayoutCatalog {
    // Same codes as the built-in table, scaled down to keep the test fast
    LayoutCatalog::from_entries([
        theme_resizer::catalog::LayoutEntry::new("158A", 108, 172),
        theme_resizer::catalog::LayoutEntry::new("264B", 102, 304),
    ])
}

#[test]
fn drop_folder_to_zip_bundle() {
    let folder = setup_drop_folder();
    let inputs = pipeline::collect_inputs(&[folder.path().to_path_buf()]).unwrap();
    assert_eq!(inputs.len(), 5);

    let mut batch = BatchPipeline::new(
        RustBackend::new(),
        small_catalog(),
        PipelineOptions {
            filter: ResampleFilter::Triangle,
        },
    );
    let (tx, rx) = std::sync::mpsc::channel();
    let summary = batch.process(inputs, Some(&tx));
    drop(tx);
    let events: Vec<PipelineEvent> = rx.iter().collect();

    assert_eq!(summary.rendered, 4);
    assert_eq!(summary.unsupported, 1);
    assert_eq!(summary.ignored, 1);
    assert_eq!(summary.failed, 0);
    assert!(events.iter().any(|e| matches!(
        e,
        PipelineEvent::Unsupported { source, extension } if source == "c_old.rar" && extension == "rar"
    )));

    // Submission order, archive members inline
    let names: Vec<&str> = batch.records().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["158A.png", "264B.png", "extra.png", "e_banner.png"]);

    // Edit the unmatched banner before export
    batch
        .update_record(3, &RecordUpdate::custom_size(60, 20))
        .unwrap();
    batch.update_record(2, &RecordUpdate::rename("x.png")).unwrap();
    batch.remove_record(1).unwrap();

    let entries = unzip(&batch.export_all().unwrap());
    assert_eq!(
        entries,
        vec![
            ("158A.png".to_string(), (108, 172)),
            ("x.png".to_string(), (25, 15)),
            ("e_banner.png".to_string(), (60, 20)),
        ]
    );
}

#[test]
fn split_export_writes_pngs() {
    let folder = setup_drop_folder();
    let inputs = pipeline::collect_inputs(&[folder.path().join("e_banner.png")]).unwrap();
    let mut batch = BatchPipeline::new(
        RustBackend::new(),
        LayoutCatalog::empty(),
        PipelineOptions::default(),
    );
    batch.process(inputs.clone(), None);
    batch.process(inputs, None);

    let out = TempDir::new().unwrap();
    let paths = batch.export_individual(out.path()).unwrap();
    assert_eq!(
        paths,
        vec![out.path().join("e_banner.png"), out.path().join("e_banner-2.png")]
    );
    for path in &paths {
        let img = image::open(path).unwrap();
        assert_eq!((img.width(), img.height()), (120, 40));
    }
}

#[test]
fn config_extras_join_the_builtin_catalog() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        r#"
[[catalog.layouts]]
code = "700A"
width = 12
height = 16

[render]
filter = "nearest"
"#,
    )
    .unwrap();
    let config = config::load_config(dir.path()).unwrap();
    let catalog = config.builtin_catalog();
    assert_eq!(catalog.lookup("158A").unwrap().size(), (1080, 1720));

    let mut batch = BatchPipeline::new(
        RustBackend::new(),
        catalog,
        PipelineOptions {
            filter: config.render.filter,
        },
    );
    batch.process(
        vec![pipeline::InputFile::new(
            "logo-700a.png",
            encode(5, 5, ImageFormat::Png),
        )],
        None,
    );
    let r = &batch.records()[0];
    assert_eq!(r.name, "700A.png");
    assert_eq!((r.width, r.height), (12, 16));
    assert!(!r.is_custom_size);
}
