pub mod analysis;
pub mod furniture;
pub mod upload;
