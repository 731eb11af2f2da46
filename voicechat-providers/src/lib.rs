pub mod chat_socket;
pub mod parse;
pub mod request;
pub mod runtime;
pub mod stt;
