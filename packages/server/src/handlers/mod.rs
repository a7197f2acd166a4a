pub mod activity;
pub mod auth;
pub mod certificate;
pub mod enrollment;
pub mod identity;
pub mod report;
