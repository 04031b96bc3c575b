//! Report generation against staged metadata directories.

use std::fs;

use shotpull::report;

/// An empty result set still renders a complete HTML document.
#[test]
fn empty_metadata_renders_html_document() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("metadata.xml"), "<screenshots></screenshots>").unwrap();

    let index = report::generate_report(dir.path()).unwrap();
    let html = fs::read_to_string(&index).unwrap();

    assert!(html.contains("<html>"));
    assert_eq!(index, dir.path().join("index.html"));
}

#[test]
fn report_includes_pulled_tiles() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("metadata.xml"),
        r#"<screenshots>
  <screenshot>
    <name>FeedViewTest_testLoaded</name>
    <tile_width>1</tile_width>
    <tile_height>2</tile_height>
  </screenshot>
</screenshots>"#,
    )
    .unwrap();
    fs::write(dir.path().join("FeedViewTest_testLoaded.png"), b"png").unwrap();
    fs::write(dir.path().join("FeedViewTest_testLoaded_0_1.png"), b"png").unwrap();

    let index = report::generate_report(dir.path()).unwrap();
    let html = fs::read_to_string(index).unwrap();

    assert!(html.contains("FeedViewTest_testLoaded"));
    assert!(html.contains("<img src=\"./FeedViewTest_testLoaded.png\" />"));
    assert!(html.contains("<img src=\"./FeedViewTest_testLoaded_0_1.png\" />"));
}

#[test]
fn malformed_metadata_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("metadata.xml"),
        "<screenshots><screenshot></screenshots>",
    )
    .unwrap();

    assert!(report::generate_report(dir.path()).is_err());
}

#[test]
fn assets_are_written_next_to_the_report() {
    let dir = tempfile::tempdir().unwrap();
    report::copy_assets(dir.path()).unwrap();

    let css = fs::read_to_string(dir.path().join("default.css")).unwrap();
    let js = fs::read_to_string(dir.path().join("default.js")).unwrap();
    assert!(css.contains(".screenshot"));
    assert!(js.contains("view_dump"));
}
