pub mod formats;
pub mod from_masks;
pub mod masks;
pub mod select;
