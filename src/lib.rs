pub mod candidates;
pub mod detect;
pub mod dto;
pub mod error;
pub mod fuzz;
pub mod locale;
pub mod normalize;
pub mod record;
pub mod report;
pub mod response;
pub mod score;
pub mod util;
