//! Level III product decoding tests on synthetic products.

use bytes::Bytes;
use nexrad_decode::level3::{DataLevelCode, Level3File, Level3MessageFactory, LevelEncoding, Packet};
use nexrad_decode::{DecodeError, WireReader};
use test_utils::fixtures::{products, site, time};
use test_utils::generators::*;
use test_utils::{assert_approx_eq, temp_test_dir, write_test_file};

fn digital_reflectivity_params() -> DescriptionParams {
    let mut params = DescriptionParams::new(products::DIGITAL_REFLECTIVITY);
    // -32.0 dBZ minimum, 0.5 dBZ increment, 254 levels
    params.thresholds[0] = (-320i16) as u16;
    params.thresholds[1] = 5;
    params.thresholds[2] = 254;
    params
}

fn digital_reflectivity_product() -> Vec<u8> {
    let radials = vec![vec![0, 2, 66, 130, 1], vec![2, 2, 2, 2, 2], vec![255, 0, 0, 0, 0]];
    level3_product(digital_reflectivity_params(), &[digital_radial_packet(&radials)])
}

// ============================================================================
// Graphic products
// ============================================================================

#[test]
fn test_digital_radial_product() {
    let data = digital_reflectivity_product();
    let length = data.len();
    let mut reader = WireReader::new(data);

    let message = Level3MessageFactory::create(&mut reader).unwrap();
    assert_eq!(reader.position(), length);

    assert_eq!(message.product_code(), products::DIGITAL_REFLECTIVITY);
    assert_eq!(message.header.timestamp().to_rfc3339(), time::RFC3339);
    assert!(message.graphic.is_none());
    assert!(message.tabular.is_none());

    let description = &message.description;
    assert_approx_eq!(description.latitude(), site::LATITUDE, 1e-4);
    assert_approx_eq!(description.longitude(), site::LONGITUDE, 1e-4);
    assert_eq!(description.volume_scan_start().to_rfc3339(), time::RFC3339);
    assert_eq!(description.generation_time().to_rfc3339(), "2022-10-28T00:45:00+00:00");
    assert_eq!(description.level_encoding(), LevelEncoding::MinIncrement);
    assert_eq!(description.number_of_levels(), Some(254));
    assert_approx_eq!(description.elevation().unwrap(), 0.5, 1e-6);
    assert_eq!(description.data_level_code(0), Some(DataLevelCode::BelowThreshold));
    assert_eq!(description.data_value(0), None);
    assert_approx_eq!(description.data_value(2).unwrap(), -32.0, 1e-4);
    assert_approx_eq!(description.data_value(66).unwrap(), 0.0, 1e-4);

    let packets: Vec<&Packet> = message.packets().collect();
    assert_eq!(packets.len(), 1);
    let Packet::DigitalRadialDataArray(radial) = packets[0] else {
        panic!("Expected digital radial data array, got {:?}", packets[0]);
    };
    assert_eq!(radial.number_of_radials, 3);
    assert_eq!(radial.radials[0].levels, vec![0, 2, 66, 130, 1]);
    assert_approx_eq!(radial.radials[1].start_angle_degrees(), 1.0, 1e-6);
    assert_approx_eq!(radial.radials[2].angle_delta_degrees(), 1.0, 1e-6);
}

#[test]
fn test_compressed_digital_radial_product() {
    let radials = vec![vec![0, 2, 66, 130, 1], vec![2, 2, 2, 2, 2], vec![255, 0, 0, 0, 0]];
    let layers = [digital_radial_packet(&radials)];
    let data = compressed_level3_product(digital_reflectivity_params(), &layers);
    let length = data.len();
    let mut reader = WireReader::new(data);

    let message = Level3MessageFactory::create(&mut reader).unwrap();
    assert_eq!(reader.position(), length);
    assert!(message.description.is_compression_enabled());
    assert_eq!(
        message.description.uncompressed_size() as usize,
        level3_product(digital_reflectivity_params(), &layers).len()
    );

    let Some(Packet::DigitalRadialDataArray(radial)) = message.packets().next() else {
        panic!("Expected digital radial data array");
    };
    assert_eq!(radial.number_of_radials, 3);
    assert_eq!(radial.radials[0].levels, vec![0, 2, 66, 130, 1]);
}

#[test]
fn test_raster_product() {
    let rows = vec![vec![(3, 1), (2, 5)], vec![(1, 15), (4, 0), (1, 2)]];
    let data = level3_product(DescriptionParams::new(products::COMPOSITE_REFLECTIVITY), &[raster_packet(&rows)]);
    let mut reader = WireReader::new(data);

    let message = Level3MessageFactory::create(&mut reader).unwrap();
    assert_eq!(message.description.level_encoding(), LevelEncoding::Coded);
    assert_eq!(message.description.elevation(), None);

    let Some(Packet::RasterData(raster)) = message.packets().next() else {
        panic!("Expected raster packet");
    };
    assert_eq!(raster.number_of_rows, 2);
    assert_eq!(raster.rows[0], vec![1, 1, 1, 5, 5]);
    assert_eq!(raster.rows[1], vec![15, 0, 0, 0, 0, 2]);
}

#[test]
fn test_packet_failure_ends_layer_only() {
    // Rows shorter than the cell count are rejected
    let mut bad_layer = digital_raster_packet(4, &[(2, vec![1, 2])]);
    bad_layer.extend(text_packet(0, 0, "LOST"));
    let good_layer = text_packet(10, -20, "KEPT");

    let data = level3_product(DescriptionParams::new(products::STORM_TRACKING), &[bad_layer, good_layer]);
    let length = data.len();
    let mut reader = WireReader::new(data);

    let message = Level3MessageFactory::create(&mut reader).unwrap();
    let symbology = message.symbology.as_ref().unwrap();
    assert_eq!(symbology.number_of_layers, 2);
    assert!(symbology.layers[0].packets.is_empty());
    assert_eq!(symbology.layers[1].packets.len(), 1);
    assert_eq!(reader.position(), length);

    let Packet::TextAndSpecialSymbol(text) = &symbology.layers[1].packets[0] else {
        panic!("Expected text packet");
    };
    assert_eq!(text.text, "KEPT");
    assert_eq!(text.j_start, -20);
}

#[test]
fn test_unknown_packet_code_ends_layer() {
    let mut layer = text_packet(0, 0, "AB");
    layer.extend(halfwords(&[0x9999, 4, 0, 0]));
    layer.extend(text_packet(0, 0, "CD"));

    let data = level3_product(DescriptionParams::new(products::STORM_TRACKING), &[layer]);
    let message = Level3MessageFactory::create(&mut WireReader::new(data)).unwrap();
    assert_eq!(message.packets().count(), 1);
}

#[test]
fn test_graphic_and_tabular_blocks() {
    let mut params = DescriptionParams::new(products::STORM_TRACKING);
    let symbology = symbology_block(&[text_packet(1, 2, "S1")]);
    let graphic = graphic_block(&[text_packet(0, 0, "PAGE ONE"), text_packet(0, 0, "PAGE TWO")]);

    let symbology_offset = (18 + 102) / 2;
    let graphic_offset = symbology_offset + symbology.len() / 2;
    let tabular_offset = graphic_offset + graphic.len() / 2;
    params.offsets = [symbology_offset as u32, graphic_offset as u32, tabular_offset as u32];

    let tabular = tabular_block(&params, &[&["STORM ID  A0", "AZ/RAN 245/ 62"], &["NO STORMS"]]);
    let length = 18 + 102 + symbology.len() + graphic.len() + tabular.len();

    let mut data = level3_message_header(params.product_code, length as u32, 5);
    data.extend(product_description_block(&params));
    data.extend(symbology);
    data.extend(graphic);
    data.extend(tabular);

    let mut reader = WireReader::new(data);
    let message = Level3MessageFactory::create(&mut reader).unwrap();
    assert_eq!(reader.position(), length);

    let graphic = message.graphic.unwrap();
    assert_eq!(graphic.number_of_pages, 2);
    assert_eq!(graphic.pages[1].page_number, 2);
    assert_eq!(graphic.pages[1].packets.len(), 1);

    let tabular = message.tabular.unwrap();
    assert_eq!(tabular.description.product_code, products::STORM_TRACKING);
    assert_eq!(tabular.pages.len(), 2);
    assert_eq!(tabular.pages[0], vec!["STORM ID  A0", "AZ/RAN 245/ 62"]);
    assert_eq!(tabular.pages[1], vec!["NO STORMS"]);
}

// ============================================================================
// Rejected products
// ============================================================================

#[test]
fn test_unknown_compression_method_rejected() {
    let mut params = digital_reflectivity_params();
    params.dependent[7] = 2;
    let data = level3_product(params, &[digital_radial_packet(&[vec![2, 2]])]);

    let result = Level3MessageFactory::create(&mut WireReader::new(data));
    assert!(matches!(result, Err(DecodeError::UnsupportedCompression(_))));
}

#[test]
fn test_corrupt_compressed_product_rejected() {
    let mut data = compressed_level3_product(digital_reflectivity_params(), &[digital_radial_packet(&[vec![2, 2]])]);
    let last = data.len() - 1;
    data.truncate(last);
    data[8..12].copy_from_slice(&(last as u32).to_be_bytes());

    let result = Level3MessageFactory::create(&mut WireReader::new(data));
    assert!(matches!(result, Err(DecodeError::Decompression(_))));
}

#[test]
fn test_non_graphic_message_rejected() {
    let mut data = level3_message_header(products::FREE_TEXT, 120, 2);
    data.extend(product_description_block(&DescriptionParams::new(products::FREE_TEXT)));

    let result = Level3MessageFactory::create(&mut WireReader::new(data));
    assert!(matches!(result, Err(DecodeError::UnsupportedProduct(75))));
}

#[test]
fn test_block_offset_inside_header_rejected() {
    let mut params = DescriptionParams::new(products::COMPOSITE_REFLECTIVITY);
    params.offsets = [10, 0, 0];
    let mut data = level3_message_header(params.product_code, 120, 3);
    data.extend(product_description_block(&params));

    let result = Level3MessageFactory::create(&mut WireReader::new(data));
    assert!(matches!(result, Err(DecodeError::InvalidField { .. })));
}

#[test]
fn test_truncated_product() {
    let data = digital_reflectivity_product();
    let result = Level3MessageFactory::create(&mut WireReader::new(data[..100].to_vec()));
    assert!(result.unwrap_err().is_truncation());
}

// ============================================================================
// Level III files
// ============================================================================

#[test]
fn test_file_with_wmo_header() {
    let mut data = b"\x01\r\r\n000 \r\r\nSDUS54 KOUN 280044\r\r\nN0QTLX\r\r\n".to_vec();
    data.extend(digital_reflectivity_product());

    let file = Level3File::load_data(Bytes::from(data)).unwrap();
    assert_eq!(file.awips_id().as_deref(), Some("N0QTLX"));

    let header = file.wmo_header.as_ref().unwrap();
    assert_eq!(header.icao, "KOUN");
    assert_eq!(header.data_type, "SD");
    assert_eq!(file.message.product_code(), products::DIGITAL_REFLECTIVITY);
}

#[test]
fn test_file_without_wmo_header() {
    let file = Level3File::load_data(Bytes::from(digital_reflectivity_product())).unwrap();
    assert!(file.wmo_header.is_none());
    assert_eq!(file.awips_id(), None);
    assert_eq!(file.message.packets().count(), 1);
}

#[test]
fn test_load_file_from_disk() {
    let dir = temp_test_dir();
    let path = write_test_file(dir.path(), "KTLX_N0Q_20221028_0044", &digital_reflectivity_product());

    let file = Level3File::load_file(&path).unwrap();
    assert_eq!(file.message.product_code(), products::DIGITAL_REFLECTIVITY);

    let missing = Level3File::load_file(dir.path().join("missing"));
    assert!(matches!(missing, Err(DecodeError::Io(_))));
}
