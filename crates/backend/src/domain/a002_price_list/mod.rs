pub mod group_link;
pub mod repository;
pub mod service;
