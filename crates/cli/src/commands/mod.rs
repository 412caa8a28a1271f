pub mod agent;
pub mod models;
pub mod onboard;
pub mod status;
