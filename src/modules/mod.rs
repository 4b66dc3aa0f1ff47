pub mod convert;
pub mod jobs;
pub mod system;
