pub mod model;
pub mod present;
pub mod util;
