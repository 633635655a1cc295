pub mod auth;
pub mod books;
pub mod cart;
pub mod categories;
pub mod favorites;
pub mod orders;
pub mod reviews;
pub mod users;
