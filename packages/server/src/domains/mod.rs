// Business domains
pub mod intent;
pub mod participants;
