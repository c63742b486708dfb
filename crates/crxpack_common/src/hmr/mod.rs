pub mod crx_event;
pub mod hmr_payload;
pub mod runtime_message;
