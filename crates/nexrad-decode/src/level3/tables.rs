//! Level III product lookup tables.
//!
//! Product codes select how the 16 threshold halfwords of the product
//! description block are interpreted, whether halfword 51 signals compressed
//! symbology, and whether halfword 30 carries an elevation angle.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

/// Interpretation of the threshold halfwords for a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelEncoding {
    /// Legacy 8/16-level products with flag-coded thresholds
    Coded,
    /// Digital products with minimum value, increment and level count
    MinIncrement,
    /// Dual-polarization products with IEEE float scale and offset
    ScaleOffset,
    /// Digital VIL with linear and logarithmic ranges
    Logarithmic,
    /// Enhanced echo tops with data and topped masks
    EchoTops,
}

/// Special meaning attached to a data level instead of a numeric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataLevelCode {
    Blank,
    Threshold,
    NoData,
    RangeFolded,
    Biological,
    GroundClutter,
    IceCrystals,
    Graupel,
    WetSnow,
    DrySnow,
    LightModerateRain,
    HeavyRain,
    BigDrops,
    RainHail,
    Unknown,
    BelowThreshold,
    Reserved(u8),
}

impl DataLevelCode {
    /// Decodes the low byte of a coded threshold whose bit 15 is set.
    pub fn from_coded(value: u8) -> Self {
        match value {
            0 => Self::Blank,
            1 => Self::Threshold,
            2 => Self::NoData,
            3 => Self::RangeFolded,
            4 => Self::Biological,
            5 => Self::GroundClutter,
            6 => Self::IceCrystals,
            7 => Self::Graupel,
            8 => Self::WetSnow,
            9 => Self::DrySnow,
            10 => Self::LightModerateRain,
            11 => Self::HeavyRain,
            12 => Self::BigDrops,
            13 => Self::RainHail,
            14 => Self::Unknown,
            other => Self::Reserved(other),
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Self::Blank => "",
            Self::Threshold => "TH",
            Self::NoData => "ND",
            Self::RangeFolded => "RF",
            Self::Biological => "BI",
            Self::GroundClutter => "GC",
            Self::IceCrystals => "IC",
            Self::Graupel => "GR",
            Self::WetSnow => "WS",
            Self::DrySnow => "DS",
            Self::LightModerateRain => "RA",
            Self::HeavyRain => "HR",
            Self::BigDrops => "BD",
            Self::RainHail => "HA",
            Self::Unknown => "UK",
            Self::BelowThreshold => "BT",
            Self::Reserved(_) => "??",
        }
    }
}

impl fmt::Display for DataLevelCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// Descriptive information for a product code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductInfo {
    pub code: i16,
    pub mnemonic: &'static str,
    pub description: &'static str,
}

static PRODUCTS: Lazy<HashMap<i16, ProductInfo>> = Lazy::new(|| {
    [
        (19, "R", "Base Reflectivity"),
        (20, "R", "Base Reflectivity"),
        (27, "V", "Base Velocity"),
        (30, "SW", "Spectrum Width"),
        (32, "DHR", "Digital Hybrid Scan Reflectivity"),
        (37, "CR", "Composite Reflectivity"),
        (38, "CR", "Composite Reflectivity"),
        (41, "ET", "Echo Tops"),
        (48, "VWP", "VAD Wind Profile"),
        (56, "SRM", "Storm Relative Mean Radial Velocity"),
        (57, "VIL", "Vertically Integrated Liquid"),
        (58, "STI", "Storm Tracking Information"),
        (59, "HI", "Hail Index"),
        (61, "TVS", "Tornado Vortex Signature"),
        (62, "SS", "Storm Structure"),
        (78, "OHP", "One-Hour Precipitation"),
        (80, "STP", "Storm Total Precipitation"),
        (94, "DR", "Digital Base Reflectivity"),
        (99, "DV", "Digital Base Velocity"),
        (134, "DVL", "Digital VIL"),
        (135, "EET", "Enhanced Echo Tops"),
        (138, "DSP", "Digital Storm Total Precipitation"),
        (141, "MD", "Mesocyclone Detection"),
        (153, "SDR", "Super-Resolution Digital Base Reflectivity"),
        (154, "SDV", "Super-Resolution Digital Base Velocity"),
        (155, "SDW", "Super-Resolution Digital Spectrum Width"),
        (159, "DZD", "Digital Differential Reflectivity"),
        (161, "DCC", "Digital Correlation Coefficient"),
        (163, "DKD", "Digital Specific Differential Phase"),
        (165, "DHC", "Digital Hydrometeor Classification"),
        (166, "ML", "Melting Layer"),
        (169, "OHA", "One-Hour Accumulation"),
        (170, "DAA", "Digital Accumulation Array"),
        (172, "DTA", "Digital Storm Total Accumulation"),
        (173, "DUA", "Digital User-Selectable Accumulation"),
        (174, "DOD", "Digital One-Hour Difference Accumulation"),
        (175, "DSD", "Digital Storm Total Difference Accumulation"),
        (176, "DPR", "Digital Instantaneous Precipitation Rate"),
        (177, "HHC", "Hybrid Hydrometeor Classification"),
        (180, "TDR", "TDWR Digital Base Reflectivity"),
        (182, "TDV", "TDWR Digital Base Velocity"),
        (186, "TZL", "TDWR Long Range Digital Base Reflectivity"),
        (193, "DSR", "Super-Resolution Digital Base Reflectivity (Hybrid)"),
        (195, "DRR", "Digital Reflectivity Data Array"),
    ]
    .into_iter()
    .map(|(code, mnemonic, description)| {
        (
            code,
            ProductInfo {
                code,
                mnemonic,
                description,
            },
        )
    })
    .collect()
});

/// Looks up descriptive information for a product code.
pub fn product_info(product_code: i16) -> Option<&'static ProductInfo> {
    PRODUCTS.get(&product_code)
}

/// Threshold interpretation for a product code.
pub fn level_encoding(product_code: i16) -> LevelEncoding {
    match product_code {
        32 | 93 | 94 | 99 | 153 | 154 | 155 | 180 | 182 | 186 | 193 | 195 => LevelEncoding::MinIncrement,
        138 | 159 | 161 | 163 | 167 | 168 | 170 | 172 | 173 | 174 | 175 | 176 | 178 => {
            LevelEncoding::ScaleOffset
        }
        134 => LevelEncoding::Logarithmic,
        135 => LevelEncoding::EchoTops,
        _ => LevelEncoding::Coded,
    }
}

/// Products whose halfword 51 may flag bzip2-compressed symbology.
pub fn supports_compression(product_code: i16) -> bool {
    matches!(
        product_code,
        32 | 94
            | 99
            | 134
            | 135
            | 138
            | 149
            | 152
            | 153
            | 154
            | 155
            | 159
            | 161
            | 163
            | 165
            | 167
            | 168
            | 170
            | 172
            | 173
            | 174
            | 175
            | 176
            | 177
            | 178
            | 179
            | 180
            | 182
            | 186
            | 193
            | 195
            | 202
    )
}

/// Products whose halfword 30 is an elevation angle in tenths of a degree.
pub fn has_elevation(product_code: i16) -> bool {
    matches!(
        product_code,
        19..=30
            | 43..=46
            | 55
            | 56
            | 93
            | 94
            | 99
            | 153..=155
            | 159
            | 161
            | 163
            | 165
            | 180
            | 182
            | 186
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_encoding_selection() {
        assert_eq!(level_encoding(19), LevelEncoding::Coded);
        assert_eq!(level_encoding(94), LevelEncoding::MinIncrement);
        assert_eq!(level_encoding(159), LevelEncoding::ScaleOffset);
        assert_eq!(level_encoding(134), LevelEncoding::Logarithmic);
        assert_eq!(level_encoding(135), LevelEncoding::EchoTops);
    }

    #[test]
    fn test_product_info() {
        let info = product_info(94).unwrap();
        assert_eq!(info.mnemonic, "DR");
        assert!(product_info(1).is_none());
    }

    #[test]
    fn test_coded_levels() {
        assert_eq!(DataLevelCode::from_coded(3), DataLevelCode::RangeFolded);
        assert_eq!(DataLevelCode::from_coded(200), DataLevelCode::Reserved(200));
        assert_eq!(DataLevelCode::NoData.to_string(), "ND");
    }

    #[test]
    fn test_compression_and_elevation_sets() {
        assert!(supports_compression(94));
        assert!(!supports_compression(19));
        assert!(has_elevation(19));
        assert!(!has_elevation(37));
    }
}
