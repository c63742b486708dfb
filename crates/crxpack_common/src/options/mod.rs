pub mod crx_options;
pub mod normalized_crx_options;
