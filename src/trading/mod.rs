//! Approvals and position management on top of a [`Route`].

mod approvals;
mod positions;
mod route;
mod snapshot;

pub use approvals::{ApprovalOrchestrator, Grant, Spender, REQUIRED_GRANTS};
pub use positions::{
    merge_call, redeem_call, redeem_neg_risk_call, split_call, MarketKind, PositionOps,
};
pub use route::Route;
pub use snapshot::{format_collateral, AllowanceSnapshot};
