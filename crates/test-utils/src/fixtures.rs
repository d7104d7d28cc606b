//! Common test fixtures for NEXRAD decoder tests.
//!
//! Values describe a single synthetic scan from KTLX (Oklahoma City) taken
//! at 2022-10-28 00:44 UTC, so decoded timestamps and coordinates can be
//! asserted against known constants.

/// Radar site used by the generators.
pub mod site {
    pub const ICAO: &str = "KTLX";

    pub const LATITUDE: f32 = 35.333;
    pub const LONGITUDE: f32 = -97.278;

    /// Product description blocks store coordinates in 0.001 degrees
    pub const LATITUDE_MILLIDEGREES: i32 = 35_333;
    pub const LONGITUDE_MILLIDEGREES: i32 = -97_278;

    /// Site height above sea level, meters (Level II) and feet (Level III)
    pub const HEIGHT_M: i16 = 370;
    pub const HEIGHT_FT: i16 = 1_213;
}

/// Collection time shared by every generated message.
pub mod time {
    /// Days since 1969-12-31, so day 1 is 1970-01-01
    pub const MODIFIED_JULIAN_DATE: u16 = 19_294;

    pub const SECONDS_OF_DAY: u32 = 2_640;
    pub const MILLISECONDS_OF_DAY: u32 = SECONDS_OF_DAY * 1_000;

    /// The instant above in RFC 3339 form
    pub const RFC3339: &str = "2022-10-28T00:44:00+00:00";
}

/// Level III product codes exercised in tests.
pub mod products {
    /// Base reflectivity, 16 levels (run-length encoded radials)
    pub const BASE_REFLECTIVITY_16: i16 = 19;
    /// Composite reflectivity (raster)
    pub const COMPOSITE_REFLECTIVITY: i16 = 37;
    /// Digital base reflectivity (packet 16, 256 levels)
    pub const DIGITAL_REFLECTIVITY: i16 = 94;
    /// Enhanced echo tops
    pub const ENHANCED_ECHO_TOPS: i16 = 135;
    /// Storm tracking information (graphic and tabular blocks)
    pub const STORM_TRACKING: i16 = 58;
    /// Free text message, not a graphic product
    pub const FREE_TEXT: i16 = 75;
}

/// AWIPS text headers.
pub mod wmo {
    pub const SEQUENCE_LINE: &str = "887 ";
    pub const HEADING: &str = "WFUS54 KOUN 280044";
    pub const HEADING_WITH_BBB: &str = "WFUS54 KOUN 280044 CCA";
    pub const AWIPS_ID: &str = "TOROUN";

    pub const TORNADO_WARNING_BODY: &[&str] = &[
        "",
        "BULLETIN - EAS ACTIVATION REQUESTED",
        "Tornado Warning",
        "National Weather Service Norman OK",
        "744 PM CDT Thu Oct 27 2022",
        "",
        "$$",
    ];
}
