//! Domain models for the storefront API.
//!
//! These are the shapes handlers serialize to JSON. Database row types stay
//! private to the `db` module and convert into these.

pub mod cart;
pub mod order;
pub mod product;
pub mod testimonial;
pub mod user;

pub use cart::{Cart, CartLine};
pub use order::{NewOrderLine, Order, OrderCustomer, OrderItem};
pub use product::{NewProduct, Product, ProductFilter, ProductPage, ProductPatch};
pub use testimonial::Testimonial;
pub use user::{CurrentUser, User};
