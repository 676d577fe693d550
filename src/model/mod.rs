mod cache_status;
mod fixture;
mod history;

pub use cache_status::*;
pub use fixture::*;
pub use history::*;
