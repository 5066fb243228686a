//! Domain types for ZoneLab

pub mod bar;
pub mod market;
pub mod portfolio;
pub mod position;
pub mod signal;
pub mod trade;
pub mod zone;

pub use bar::{Bar, BarError, BarSeries};
pub use market::MarketData;
pub use portfolio::{Portfolio, PortfolioError};
pub use position::{ExitPlan, Outcome, Position, Side};
pub use signal::{Direction, DirectionParseError, EnrichedSignal, SignalSource, TouchSignal};
pub use trade::TradeRecord;
pub use zone::{Zone, ZoneKind};
