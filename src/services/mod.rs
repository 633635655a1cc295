pub mod admin_service;
pub mod auth_service;
pub mod book_service;
pub mod cart_service;
pub mod category_service;
pub mod favorite_service;
pub mod order_service;
pub mod order_status_service;
pub mod review_service;
pub mod user_service;
