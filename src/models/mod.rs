pub mod dtos;
pub mod record;
