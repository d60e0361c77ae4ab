pub mod model;
pub mod roofline;
pub mod sweep;
