pub mod user;
pub mod holding;
pub mod price_alert;
pub mod dividend;

pub use user::Entity as User;
pub use holding::Entity as Holding;
pub use price_alert::Entity as PriceAlert;
pub use dividend::Entity as Dividend;
