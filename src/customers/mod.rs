// Customer store module
//
// Customer records, store-credit balances, and the append-only debit
// trail. The checkout commit debits balances through the usage ledger;
// this module only reads them and handles administrative top-ups.

pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;

pub use error::CustomerError;
pub use models::{
    AddCreditRequest, CreateCustomerRequest, CreditDebit, CreditHistoryResponse, Customer,
    UpdateCustomerRequest,
};
pub use repository::CustomerRepository;
