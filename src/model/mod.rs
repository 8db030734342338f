pub mod asset;
pub mod attendance;
pub mod employee;
pub mod grievance;
pub mod holiday;
pub mod invoice;
pub mod learning;
pub mod leave;
pub mod notification;
pub mod payroll;
pub mod referral;
pub mod role;
pub mod user;
