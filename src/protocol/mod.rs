pub mod http;

pub use http::HttpProtocol;

pub const API_VERSION: u32 = 7;

pub fn get_password() -> Option<String> {
    std::env::var("TMC_PASSWORD").ok()
}
