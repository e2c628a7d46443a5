//! The assistant widget: surface flags plus the coordinator event loop
//! that wires the conversation controller and both voice adapters to a
//! host UI.

pub mod coordinator;
pub mod surface;

pub use coordinator::{AssistantWidget, WidgetCommand, WidgetHandle, WidgetSnapshot};
pub use surface::SurfaceState;
