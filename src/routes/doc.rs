use utoipa::{
    Modify, OpenApi,
    openapi::{
        self, OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest},
        books::{BookList, CreateBookRequest, UpdateBookRequest},
        cart::{AddToCartRequest, CartCount, CartLine, CartView, UpdateCartItemRequest},
        categories::{CategoryList, CategoryNode, CategoryTree, CreateCategoryRequest},
        favorites::{FavoriteBookList, FavoriteCheck, FavoriteToggled, ToggleFavoriteRequest},
        orders::{
            CreateOrderRequest, CreatedOrder, OrderDetail, OrderLineDetail, OrderList,
            ShippingAddressInput, UpdateOrderStatusRequest,
        },
        reviews::{AddReviewRequest, BookReviews, ReviewWithAuthor},
        users::UserList,
    },
    error::ErrorData,
    models::{
        Book, BookCondition, BookSummary, Category, Order, OrderItem, OrderStatus, PaymentMethod,
        PaymentStatus, Review, Role, ShippingAddress, User, UserSummary,
    },
    response::{Ack, Meta},
    routes::{
        admin, auth, books, cart, categories, favorites, health, orders, params, reviews, users,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::readiness,
        auth::register,
        auth::login,
        users::get_profile,
        users::update_profile,
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        categories::get_category_tree,
        categories::get_subcategories,
        categories::get_category,
        categories::create_category,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        orders::create_order,
        orders::get_my_orders,
        orders::get_my_sales,
        orders::get_order_by_id,
        orders::update_order_status,
        reviews::add_review,
        reviews::get_reviews_by_book,
        favorites::list_favorites,
        favorites::toggle_favorite,
        favorites::check_favorite,
        admin::list_users,
        admin::delete_user,
        admin::list_books,
        admin::delete_book,
        admin::list_all_orders
    ),
    components(
        schemas(
            Role,
            BookCondition,
            PaymentMethod,
            OrderStatus,
            PaymentStatus,
            User,
            UserSummary,
            Book,
            BookSummary,
            Category,
            ShippingAddress,
            Order,
            OrderItem,
            Review,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateProfileRequest,
            UserList,
            CreateBookRequest,
            UpdateBookRequest,
            BookList,
            CreateCategoryRequest,
            CategoryList,
            CategoryNode,
            CategoryTree,
            AddToCartRequest,
            UpdateCartItemRequest,
            CartCount,
            CartLine,
            CartView,
            ShippingAddressInput,
            CreateOrderRequest,
            UpdateOrderStatusRequest,
            OrderLineDetail,
            OrderDetail,
            CreatedOrder,
            OrderList,
            AddReviewRequest,
            ReviewWithAuthor,
            BookReviews,
            ToggleFavoriteRequest,
            FavoriteToggled,
            FavoriteCheck,
            FavoriteBookList,
            params::Pagination,
            params::BookQuery,
            params::OrderListQuery,
            params::SortOrder,
            categories::SubcategoryQuery,
            health::HealthData,
            ErrorData,
            Ack,
            Meta
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Auth", description = "Registration and login"),
        (name = "Users", description = "Own profile"),
        (name = "Books", description = "Catalog"),
        (name = "Categories", description = "Category tree"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Orders", description = "Checkout and order tracking"),
        (name = "Reviews", description = "Book reviews"),
        (name = "Favorites", description = "Favorite books"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_checkout_and_status_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/orders"));
        assert!(doc.paths.paths.contains_key("/api/orders/{id}/status"));
        assert!(doc.paths.paths.contains_key("/api/cart/{book_id}"));
    }
}
