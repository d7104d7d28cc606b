//! AWIPS text products and the WMO bulletin header.

mod text_product;
mod text_product_file;
mod wmo_header;

pub use text_product::TextProductMessage;
pub use text_product_file::{year_month_from_filename, TextProductFile};
pub use wmo_header::{WmoHeader, YearMonth};
