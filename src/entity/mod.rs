pub mod audit_logs;
pub mod books;
pub mod cart_items;
pub mod categories;
pub mod enums;
pub mod favorites;
pub mod order_items;
pub mod orders;
pub mod reviews;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use books::Entity as Books;
pub use cart_items::Entity as CartItems;
pub use categories::Entity as Categories;
pub use favorites::Entity as Favorites;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use reviews::Entity as Reviews;
pub use users::Entity as Users;
