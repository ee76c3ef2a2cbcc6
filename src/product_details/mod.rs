mod attributes;
mod product;

pub use product::{strip_label, ProductRecord, COLUMNS, DETAIL_TIMEOUT};
