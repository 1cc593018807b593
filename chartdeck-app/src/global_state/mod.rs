pub mod session;
pub mod theme;
pub mod toasts;
