mod pass;
mod scan;

pub use pass::*;
pub use scan::*;
