pub mod caption_list;
pub mod preview;
