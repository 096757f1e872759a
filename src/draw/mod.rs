pub mod geometry;
pub mod overlay;
pub mod scale;
pub mod xml;
