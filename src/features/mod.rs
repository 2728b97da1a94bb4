pub mod association;
pub mod coordinates;
pub mod photos;
pub mod places;
pub mod seeding;
