pub mod analysis;
pub mod scene;
