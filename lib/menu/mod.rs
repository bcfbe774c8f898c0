/// Gophermap parsing and section rendering.
pub mod gophermap;
/// Menu line construction and item-type classification.
pub mod line;
/// Directory listings rendered as menu fragments.
pub mod listing;
