//! Site components built on the toggle engine.

pub mod accordion;
pub mod dropdown;
pub mod mobile_menu;
pub mod search;

pub use accordion::Accordion;
pub use dropdown::Dropdown;
pub use mobile_menu::MobileMenu;
pub use search::Search;
