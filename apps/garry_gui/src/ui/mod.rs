//! UI 模块

pub mod deck;
pub mod sidebar;
pub mod theme;

pub use deck::PlayerDeck;
pub use sidebar::ChapterSidebar;
pub use theme::GarryTheme;
