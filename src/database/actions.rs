mod favorites;
mod ingredients;
mod recipes;
mod shopping;
mod subscriptions;
mod tags;

pub use favorites::*;
pub use ingredients::*;
pub use recipes::*;
pub use shopping::*;
pub use subscriptions::*;
pub use tags::*;
