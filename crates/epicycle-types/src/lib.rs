pub mod model;
pub mod stage;
pub mod status;
pub mod vars;

pub use model::*;
pub use stage::*;
pub use status::*;
pub use vars::*;
