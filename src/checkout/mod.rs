// Checkout module
//
// Cart value types and the quote/commit HTTP surface. The cart is
// caller-owned and ephemeral; this module never persists it.

pub mod error;
pub mod handlers;
pub mod models;

pub use error::CheckoutError;
pub use models::{
    AdjustmentBucket, AppliedAdjustment, Cart, CartAdjustments, CartItem, CommitRequest,
    CommitResponse, CreditAdjustment, ItemAdjustments, QuoteRequest, QuoteResponse,
};
