pub mod clips;
pub mod persona;
pub mod project;
pub mod worker;
