pub mod codes;
pub mod dates;
pub mod mailer;
pub mod referrals;
pub mod registration;
pub mod security;
pub mod verify;

pub use codes::*;
pub use dates::*;
pub use mailer::*;
pub use referrals::*;
pub use registration::*;
pub use security::*;
pub use verify::*;
