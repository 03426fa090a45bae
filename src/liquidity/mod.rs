pub mod ratio;

pub use ratio::{compute_matching_amount, compute_withdrawal_amounts};
