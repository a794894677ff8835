pub mod builtin;
pub mod catalog;
pub mod model;
pub mod seeder;
