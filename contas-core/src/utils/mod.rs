pub mod datetime;
mod mask;

pub use mask::mask_account_number;
