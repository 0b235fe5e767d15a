//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;
pub mod booking;

pub use product::{Product, ProductError, Reference};
pub use order::{NewOrderItem, NewVendorOrder, OrderError, OrderItem, OrderStatus, PaymentSession, PaymentStatus, VendorOrder};
pub use cart::{Cart, CartItem};
pub use booking::{Booking, BookingStatus};
