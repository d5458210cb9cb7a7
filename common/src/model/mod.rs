pub mod meal;
pub mod menu;
