pub mod activity;
pub mod enrollment;
pub mod role;
pub mod role_permission;
pub mod user;
