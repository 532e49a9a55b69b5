pub mod referral;
pub mod referral_code;
pub mod user;

pub mod prelude {
    pub use super::referral::{self, Entity as Referral};
    pub use super::referral_code::{self, Entity as ReferralCode};
    pub use super::user::{self, Entity as User};
}
