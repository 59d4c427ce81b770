// Market data domain
pub mod indicator_frame;
pub mod price_table;
pub mod series;
pub mod snapshot;
