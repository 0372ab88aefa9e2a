mod holdings_model;
mod holdings_traits;

pub use holdings_model::{
    holding_ref, CashBalance, Holding, Position, Transaction, TransactionKey, TransactionKind,
};
pub use holdings_traits::{
    CashBalanceRepositoryTrait, HoldingRepositoryTrait, PositionRepositoryTrait,
    TransactionRepositoryTrait,
};
