pub mod action;
pub mod app;
pub mod keybindings;
pub mod theme;
pub mod widgets;

pub use action::{Action, ActionCategory};
pub use app::{App, AppEvent, Pane};
pub use keybindings::{KeyBinding, KeyBindings, KeyPattern};
pub use theme::Theme;
