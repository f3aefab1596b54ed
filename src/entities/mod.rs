pub mod character;
pub mod inventory;
pub mod item;
