pub mod analysis_request;
pub mod region;
pub mod result;
pub mod source_image;
pub mod user;
