pub mod currency;
pub mod money;
pub mod period;
pub mod record;

pub use currency::{escape_symbol, CurrencyContext, CurrencyError};
pub use money::Money;
pub use period::DateRange;
pub use record::{PaymentMethod, ReceiptRecord};
