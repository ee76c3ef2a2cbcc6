mod listing;

pub use listing::{ProductListing, PRODUCT_CARD_MARKER};
