pub mod timing;

pub use timing::{on_request_complete, on_request_start, track_requests, RequestStart};
