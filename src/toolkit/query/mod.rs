pub mod reply;

pub use reply::extract_json_block;
