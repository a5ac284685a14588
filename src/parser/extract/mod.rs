pub mod company;
pub mod jobs;
