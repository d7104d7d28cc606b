//! Decoding of real radar captures.
//!
//! These tests are skipped unless the sample files are present in
//! `crates/nexrad-decode/testdata/` or `TEST_DATA_DIR`.

use nexrad_decode::awips::TextProductFile;
use nexrad_decode::level2::{Archive2File, Level2MessageFactory};
use nexrad_decode::level3::Level3File;
use test_utils::{require_test_file, require_test_files};

#[test]
fn test_archive2_sample() {
    let path = require_test_file!("KTLX20221028_004400_V06");

    let file = Archive2File::load_file(&path, &Level2MessageFactory::new()).expect("Failed to load Archive II sample");
    println!("Volume: {:?}", file.volume_header);
    println!("Messages: {}", file.messages.len());
    assert!(!file.messages.is_empty());
    assert!(file.volume_coverage_pattern().is_some());
    for (elevation, radials) in file.elevation_scans() {
        println!("  Elevation {}: {} radials", elevation, radials.len());
        assert!(radials.len() <= 720);
    }
}

#[test]
fn test_level3_base_reflectivity_sample() {
    let path = require_test_file!("KTLX_N0R_20221028_0044.nids");

    let file = Level3File::load_file(&path).expect("Failed to load Level III sample");
    println!("AWIPS id: {:?}", file.awips_id());
    println!("Product: {}", file.message.product_code());

    let description = &file.message.description;
    assert!((-90.0..=90.0).contains(&description.latitude()));
    assert!((-180.0..=180.0).contains(&description.longitude()));
    assert!(file.message.packets().count() > 0);
}

#[test]
fn test_level3_and_text_samples_together() {
    let paths = require_test_files!("KTLX_N0R_20221028_0044.nids", "warnings_20221028_00.txt");
    let (product, warnings) = (&paths[0], &paths[1]);

    let file = Level3File::load_file(product).expect("Failed to load Level III sample");
    let mut text = TextProductFile::new();
    assert!(text.load_file(warnings).expect("Failed to read text sample"));

    // Both captures come from the same day
    let scan = file.message.description.volume_scan_start();
    for message in text.messages() {
        let issued = message.issued(None).expect("Text product has no issue time");
        assert!((issued - scan).num_hours().abs() <= 24);
    }
}

#[test]
fn test_text_product_sample() {
    let path = require_test_file!("warnings_20221028_00.txt");

    let mut file = TextProductFile::new();
    assert!(file.load_file(&path).expect("Failed to read text sample"));
    println!(
        "Products: {} ({} duplicates)",
        file.message_count(),
        file.duplicate_count()
    );
    for message in file.messages() {
        assert!(message.issued(None).is_some(), "{} has no issue time", message.header.awips_id());
    }
}
