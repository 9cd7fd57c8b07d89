mod contact;
mod cover;
mod position;
mod rain;

pub use contact::*;
pub use cover::*;
pub use position::*;
pub use rain::*;
