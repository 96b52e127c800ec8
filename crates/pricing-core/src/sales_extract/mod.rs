pub mod aggregate;
pub mod sizes;
