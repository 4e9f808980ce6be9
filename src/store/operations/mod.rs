pub mod history;
pub mod identity;
pub mod maintenance;
pub mod results;
pub mod review;
pub mod stats;
