pub mod json_review;

pub use json_review::JsonReviewFormatter;
