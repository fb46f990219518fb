pub mod input;
pub mod requests;
pub mod tools;

pub use input::{InputEvent, Modifiers};
pub use requests::{CreateBlockRequest, CreateConnectionRequest, Request, RouteHit};
pub use tools::{ConnectTool, Hit, LibraryPicker, SelectTool, Tool, ToolKind};
