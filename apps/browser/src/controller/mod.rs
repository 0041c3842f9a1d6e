//! Controller layer: input events, error guidance, and command orchestration
//! over the view controllers.

pub mod events;
pub mod orchestration;
