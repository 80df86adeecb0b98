pub mod acquire;
