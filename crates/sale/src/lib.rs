pub mod decoder;
pub mod filter;
pub mod format;
pub mod marketplace;
pub mod registry;

pub use decoder::{decode_sale, DecodeReject};
pub use filter::{EnrichedSale, RejectReason, SaleFilter};
pub use format::format_notification;
pub use marketplace::{Marketplace, Marketplaces};
pub use registry::{Project, ProjectRegistry};
